//! Read-only queries over committed state

use crate::keeper::{load_group, load_policy, load_proposal, GroupKeeper};
use crate::router::ActionRouter;
use crate::tally::tally_proposal;
use group_store::{GroupStore, QueryWindow};
use group_types::{
    Address, GroupError, GroupId, GroupInfo, GroupMember, GroupPolicyInfo, GroupResult,
    Proposal, ProposalId, ProposalStatus, TallyResult, Vote,
};

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    pub fn group_info(&self, group_id: GroupId) -> GroupResult<GroupInfo> {
        load_group(&self.store, group_id)
    }

    pub fn groups(&self, window: QueryWindow) -> GroupResult<Vec<GroupInfo>> {
        Ok(self.store.list_groups(window)?)
    }

    pub fn group_members(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> GroupResult<Vec<GroupMember>> {
        Ok(self.store.members_by_group(group_id, window)?)
    }

    pub fn groups_by_admin(
        &self,
        admin: &Address,
        window: QueryWindow,
    ) -> GroupResult<Vec<GroupInfo>> {
        Ok(self.store.groups_by_admin(admin, window)?)
    }

    pub fn groups_by_member(
        &self,
        address: &Address,
        window: QueryWindow,
    ) -> GroupResult<Vec<GroupInfo>> {
        self.store
            .groups_by_member(address, window)?
            .into_iter()
            .map(|id| load_group(&self.store, id))
            .collect()
    }

    pub fn group_policy_info(&self, address: &Address) -> GroupResult<GroupPolicyInfo> {
        load_policy(&self.store, address)
    }

    pub fn group_policies_by_group(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> GroupResult<Vec<GroupPolicyInfo>> {
        Ok(self.store.policies_by_group(group_id, window)?)
    }

    pub fn group_policies_by_admin(
        &self,
        admin: &Address,
        window: QueryWindow,
    ) -> GroupResult<Vec<GroupPolicyInfo>> {
        Ok(self.store.policies_by_admin(admin, window)?)
    }

    pub fn proposal(&self, proposal_id: ProposalId) -> GroupResult<Proposal> {
        load_proposal(&self.store, proposal_id)
    }

    pub fn proposals_by_group_policy(
        &self,
        address: &Address,
        window: QueryWindow,
    ) -> GroupResult<Vec<Proposal>> {
        Ok(self.store.proposals_by_policy(address, window)?)
    }

    pub fn vote_by_proposal_voter(
        &self,
        proposal_id: ProposalId,
        voter: &Address,
    ) -> GroupResult<Vote> {
        self.store.get_vote(proposal_id, voter)?.ok_or_else(|| {
            GroupError::NotFound(format!("vote by {voter} on proposal {proposal_id}"))
        })
    }

    pub fn votes_by_proposal(
        &self,
        proposal_id: ProposalId,
        window: QueryWindow,
    ) -> GroupResult<Vec<Vote>> {
        Ok(self.store.votes_by_proposal(proposal_id, window)?)
    }

    pub fn votes_by_voter(&self, voter: &Address, window: QueryWindow) -> GroupResult<Vec<Vote>> {
        Ok(self.store.votes_by_voter(voter, window)?)
    }

    /// Current tally of an open proposal, or the frozen tally of a closed
    /// one.
    pub fn tally_result(&self, proposal_id: ProposalId) -> GroupResult<TallyResult> {
        let proposal = load_proposal(&self.store, proposal_id)?;
        if matches!(
            proposal.status,
            ProposalStatus::Withdrawn | ProposalStatus::Aborted
        ) {
            return Err(GroupError::InvalidState(format!(
                "cannot tally a proposal with status {}",
                proposal.status
            )));
        }
        let policy = load_policy(&self.store, &proposal.group_policy_address)?;
        tally_proposal(&self.store, &proposal, policy.group_id)
    }
}
