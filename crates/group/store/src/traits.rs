use crate::StorageResult;
use chrono::{DateTime, Utc};
use group_types::{
    Address, GroupId, GroupInfo, GroupMember, GroupPolicyInfo, Proposal, ProposalId, Vote,
};

/// Generic query window for paged reads. A `limit` of zero means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn page(offset: usize, limit: usize) -> Self {
        Self { limit, offset }
    }
}

/// Last values handed out by the id and address sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequences {
    pub group: u64,
    pub policy: u64,
    pub proposal: u64,
}

/// Storage interface for group governance state.
///
/// `create_*` fails with `Conflict` when the primary key exists, `update_*`
/// fails with `NotFound` when it does not. Reads return records ordered by
/// primary key unless stated otherwise.
pub trait GroupStore {
    fn sequences(&self) -> StorageResult<Sequences>;
    /// Restore sequences, e.g. when importing state.
    fn set_sequences(&mut self, sequences: Sequences) -> StorageResult<()>;

    // Groups

    /// Allocate the next group id.
    fn next_group_id(&mut self) -> StorageResult<GroupId>;
    fn get_group(&self, id: GroupId) -> StorageResult<Option<GroupInfo>>;
    fn create_group(&mut self, group: GroupInfo) -> StorageResult<()>;
    fn update_group(&mut self, group: GroupInfo) -> StorageResult<()>;
    fn list_groups(&self, window: QueryWindow) -> StorageResult<Vec<GroupInfo>>;
    fn groups_by_admin(&self, admin: &Address, window: QueryWindow)
        -> StorageResult<Vec<GroupInfo>>;

    // Members

    fn get_member(&self, group_id: GroupId, address: &Address)
        -> StorageResult<Option<GroupMember>>;
    fn create_member(&mut self, member: GroupMember) -> StorageResult<()>;
    fn update_member(&mut self, member: GroupMember) -> StorageResult<()>;
    fn delete_member(&mut self, group_id: GroupId, address: &Address) -> StorageResult<()>;
    /// Members of a group, ordered by address.
    fn members_by_group(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupMember>>;
    /// Ids of every group `address` belongs to.
    fn groups_by_member(&self, address: &Address, window: QueryWindow)
        -> StorageResult<Vec<GroupId>>;

    // Group policies

    /// Allocate the next policy account sequence number.
    fn next_policy_seq(&mut self) -> StorageResult<u64>;
    fn get_policy(&self, address: &Address) -> StorageResult<Option<GroupPolicyInfo>>;
    fn create_policy(&mut self, policy: GroupPolicyInfo) -> StorageResult<()>;
    fn update_policy(&mut self, policy: GroupPolicyInfo) -> StorageResult<()>;
    fn policies_by_group(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupPolicyInfo>>;
    fn policies_by_admin(
        &self,
        admin: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupPolicyInfo>>;

    // Proposals

    /// Allocate the next proposal id.
    fn next_proposal_id(&mut self) -> StorageResult<ProposalId>;
    fn get_proposal(&self, id: ProposalId) -> StorageResult<Option<Proposal>>;
    fn create_proposal(&mut self, proposal: Proposal) -> StorageResult<()>;
    fn update_proposal(&mut self, proposal: Proposal) -> StorageResult<()>;
    fn delete_proposal(&mut self, id: ProposalId) -> StorageResult<()>;
    fn proposals_by_policy(
        &self,
        address: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<Proposal>>;
    /// Proposals whose voting period ended at or before `until`, ordered by
    /// voting period end then id.
    fn proposals_by_voting_period_end(&self, until: DateTime<Utc>) -> StorageResult<Vec<Proposal>>;

    // Votes

    fn get_vote(&self, proposal_id: ProposalId, voter: &Address) -> StorageResult<Option<Vote>>;
    /// Fails with `Conflict` when the voter already voted on the proposal.
    fn create_vote(&mut self, vote: Vote) -> StorageResult<()>;
    fn delete_vote(&mut self, proposal_id: ProposalId, voter: &Address) -> StorageResult<()>;
    /// Votes on a proposal, ordered by voter address.
    fn votes_by_proposal(
        &self,
        proposal_id: ProposalId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Vote>>;
    fn votes_by_voter(&self, voter: &Address, window: QueryWindow) -> StorageResult<Vec<Vote>>;
}
