//! In-memory reference implementation of [`GroupStore`].
//!
//! The store is a plain value: cloning it yields an independent branch that
//! can be written and later either swapped in or dropped. The engine uses
//! this to run each operation as an all-or-nothing transaction.

use crate::traits::{GroupStore, QueryWindow, Sequences};
use crate::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use group_types::{
    Address, GroupId, GroupInfo, GroupMember, GroupPolicyInfo, Proposal, ProposalId, Vote,
};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory group store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGroupStore {
    group_seq: u64,
    policy_seq: u64,
    proposal_seq: u64,

    groups: BTreeMap<GroupId, GroupInfo>,
    groups_by_admin: BTreeSet<(Address, GroupId)>,

    members: BTreeMap<(GroupId, Address), GroupMember>,
    members_by_address: BTreeSet<(Address, GroupId)>,

    policies: BTreeMap<Address, GroupPolicyInfo>,
    policies_by_group: BTreeSet<(GroupId, Address)>,
    policies_by_admin: BTreeSet<(Address, Address)>,

    proposals: BTreeMap<ProposalId, Proposal>,
    proposals_by_policy: BTreeSet<(Address, ProposalId)>,
    proposals_by_vp_end: BTreeSet<(DateTime<Utc>, ProposalId)>,

    votes: BTreeMap<(ProposalId, Address), Vote>,
    votes_by_voter: BTreeSet<(Address, ProposalId)>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }
}

fn next(seq: &mut u64, what: &str) -> StorageResult<u64> {
    *seq = seq
        .checked_add(1)
        .ok_or_else(|| StorageError::Backend(format!("{what} sequence exhausted")))?;
    Ok(*seq)
}

/// Secondary keys stored under `prefix`, in order.
fn scan<'a, P: Ord + Clone + 'a, K: Ord + Clone + 'a>(
    index: &'a BTreeSet<(P, K)>,
    prefix: &'a P,
) -> impl Iterator<Item = &'a K> + 'a {
    index
        .iter()
        .skip_while(move |(p, _)| p < prefix)
        .take_while(move |(p, _)| p == prefix)
        .map(|(_, k)| k)
}

fn apply_window<T>(items: impl Iterator<Item = T>, window: QueryWindow) -> Vec<T> {
    let iter = items.skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}

impl GroupStore for InMemoryGroupStore {
    fn sequences(&self) -> StorageResult<Sequences> {
        Ok(Sequences {
            group: self.group_seq,
            policy: self.policy_seq,
            proposal: self.proposal_seq,
        })
    }

    fn set_sequences(&mut self, sequences: Sequences) -> StorageResult<()> {
        self.group_seq = sequences.group;
        self.policy_seq = sequences.policy;
        self.proposal_seq = sequences.proposal;
        Ok(())
    }

    fn next_group_id(&mut self) -> StorageResult<GroupId> {
        next(&mut self.group_seq, "group").map(GroupId)
    }

    fn get_group(&self, id: GroupId) -> StorageResult<Option<GroupInfo>> {
        Ok(self.groups.get(&id).cloned())
    }

    fn create_group(&mut self, group: GroupInfo) -> StorageResult<()> {
        if self.groups.contains_key(&group.id) {
            return Err(StorageError::Conflict(format!("group {} already exists", group.id)));
        }
        self.groups_by_admin.insert((group.admin.clone(), group.id));
        self.groups.insert(group.id, group);
        Ok(())
    }

    fn update_group(&mut self, group: GroupInfo) -> StorageResult<()> {
        let previous = self
            .groups
            .get(&group.id)
            .ok_or_else(|| StorageError::NotFound(format!("group {}", group.id)))?;
        self.groups_by_admin.remove(&(previous.admin.clone(), group.id));
        self.groups_by_admin.insert((group.admin.clone(), group.id));
        self.groups.insert(group.id, group);
        Ok(())
    }

    fn list_groups(&self, window: QueryWindow) -> StorageResult<Vec<GroupInfo>> {
        Ok(apply_window(self.groups.values().cloned(), window))
    }

    fn groups_by_admin(
        &self,
        admin: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupInfo>> {
        let groups = scan(&self.groups_by_admin, admin).filter_map(|id| self.groups.get(id).cloned());
        Ok(apply_window(groups, window))
    }

    fn get_member(
        &self,
        group_id: GroupId,
        address: &Address,
    ) -> StorageResult<Option<GroupMember>> {
        Ok(self.members.get(&(group_id, address.clone())).cloned())
    }

    fn create_member(&mut self, member: GroupMember) -> StorageResult<()> {
        let key = (member.group_id, member.address().clone());
        if self.members.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "member {} already in group {}",
                key.1, key.0
            )));
        }
        self.members_by_address.insert((key.1.clone(), key.0));
        self.members.insert(key, member);
        Ok(())
    }

    fn update_member(&mut self, member: GroupMember) -> StorageResult<()> {
        let key = (member.group_id, member.address().clone());
        match self.members.get_mut(&key) {
            Some(existing) => {
                *existing = member;
                Ok(())
            }
            None => Err(StorageError::NotFound(format!(
                "member {} of group {}",
                key.1, key.0
            ))),
        }
    }

    fn delete_member(&mut self, group_id: GroupId, address: &Address) -> StorageResult<()> {
        let key = (group_id, address.clone());
        if self.members.remove(&key).is_none() {
            return Err(StorageError::NotFound(format!(
                "member {address} of group {group_id}"
            )));
        }
        self.members_by_address.remove(&(address.clone(), group_id));
        Ok(())
    }

    fn members_by_group(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupMember>> {
        let members = self
            .members
            .iter()
            .skip_while(|((gid, _), _)| *gid < group_id)
            .take_while(|((gid, _), _)| *gid == group_id)
            .map(|(_, m)| m.clone());
        Ok(apply_window(members, window))
    }

    fn groups_by_member(
        &self,
        address: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupId>> {
        Ok(apply_window(
            scan(&self.members_by_address, address).copied(),
            window,
        ))
    }

    fn next_policy_seq(&mut self) -> StorageResult<u64> {
        next(&mut self.policy_seq, "group policy")
    }

    fn get_policy(&self, address: &Address) -> StorageResult<Option<GroupPolicyInfo>> {
        Ok(self.policies.get(address).cloned())
    }

    fn create_policy(&mut self, policy: GroupPolicyInfo) -> StorageResult<()> {
        if self.policies.contains_key(&policy.address) {
            return Err(StorageError::Conflict(format!(
                "group policy {} already exists",
                policy.address
            )));
        }
        self.policies_by_group
            .insert((policy.group_id, policy.address.clone()));
        self.policies_by_admin
            .insert((policy.admin.clone(), policy.address.clone()));
        self.policies.insert(policy.address.clone(), policy);
        Ok(())
    }

    fn update_policy(&mut self, policy: GroupPolicyInfo) -> StorageResult<()> {
        let previous = self
            .policies
            .get(&policy.address)
            .ok_or_else(|| StorageError::NotFound(format!("group policy {}", policy.address)))?;
        self.policies_by_admin
            .remove(&(previous.admin.clone(), policy.address.clone()));
        self.policies_by_admin
            .insert((policy.admin.clone(), policy.address.clone()));
        self.policies.insert(policy.address.clone(), policy);
        Ok(())
    }

    fn policies_by_group(
        &self,
        group_id: GroupId,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupPolicyInfo>> {
        let policies =
            scan(&self.policies_by_group, &group_id).filter_map(|a| self.policies.get(a).cloned());
        Ok(apply_window(policies, window))
    }

    fn policies_by_admin(
        &self,
        admin: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<GroupPolicyInfo>> {
        let policies =
            scan(&self.policies_by_admin, admin).filter_map(|a| self.policies.get(a).cloned());
        Ok(apply_window(policies, window))
    }

    fn next_proposal_id(&mut self) -> StorageResult<ProposalId> {
        next(&mut self.proposal_seq, "proposal").map(ProposalId)
    }

    fn get_proposal(&self, id: ProposalId) -> StorageResult<Option<Proposal>> {
        Ok(self.proposals.get(&id).cloned())
    }

    fn create_proposal(&mut self, proposal: Proposal) -> StorageResult<()> {
        if self.proposals.contains_key(&proposal.id) {
            return Err(StorageError::Conflict(format!(
                "proposal {} already exists",
                proposal.id
            )));
        }
        self.proposals_by_policy
            .insert((proposal.group_policy_address.clone(), proposal.id));
        self.proposals_by_vp_end
            .insert((proposal.voting_period_end, proposal.id));
        self.proposals.insert(proposal.id, proposal);
        Ok(())
    }

    fn update_proposal(&mut self, proposal: Proposal) -> StorageResult<()> {
        let previous = self
            .proposals
            .get(&proposal.id)
            .ok_or_else(|| StorageError::NotFound(format!("proposal {}", proposal.id)))?;
        self.proposals_by_vp_end
            .remove(&(previous.voting_period_end, proposal.id));
        self.proposals_by_vp_end
            .insert((proposal.voting_period_end, proposal.id));
        self.proposals.insert(proposal.id, proposal);
        Ok(())
    }

    fn delete_proposal(&mut self, id: ProposalId) -> StorageResult<()> {
        let proposal = self
            .proposals
            .remove(&id)
            .ok_or_else(|| StorageError::NotFound(format!("proposal {id}")))?;
        self.proposals_by_policy
            .remove(&(proposal.group_policy_address, id));
        self.proposals_by_vp_end
            .remove(&(proposal.voting_period_end, id));
        Ok(())
    }

    fn proposals_by_policy(
        &self,
        address: &Address,
        window: QueryWindow,
    ) -> StorageResult<Vec<Proposal>> {
        let proposals = scan(&self.proposals_by_policy, address)
            .filter_map(|id| self.proposals.get(id).cloned());
        Ok(apply_window(proposals, window))
    }

    fn proposals_by_voting_period_end(
        &self,
        until: DateTime<Utc>,
    ) -> StorageResult<Vec<Proposal>> {
        Ok(self
            .proposals_by_vp_end
            .iter()
            .take_while(|(end, _)| *end <= until)
            .filter_map(|(_, id)| self.proposals.get(id).cloned())
            .collect())
    }

    fn get_vote(&self, proposal_id: ProposalId, voter: &Address) -> StorageResult<Option<Vote>> {
        Ok(self.votes.get(&(proposal_id, voter.clone())).cloned())
    }

    fn create_vote(&mut self, vote: Vote) -> StorageResult<()> {
        let key = (vote.proposal_id, vote.voter.clone());
        if self.votes.contains_key(&key) {
            return Err(StorageError::Conflict(format!(
                "vote by {} on proposal {}",
                key.1, key.0
            )));
        }
        self.votes_by_voter.insert((key.1.clone(), key.0));
        self.votes.insert(key, vote);
        Ok(())
    }

    fn delete_vote(&mut self, proposal_id: ProposalId, voter: &Address) -> StorageResult<()> {
        if self.votes.remove(&(proposal_id, voter.clone())).is_none() {
            return Err(StorageError::NotFound(format!(
                "vote by {voter} on proposal {proposal_id}"
            )));
        }
        self.votes_by_voter.remove(&(voter.clone(), proposal_id));
        Ok(())
    }

    fn votes_by_proposal(
        &self,
        proposal_id: ProposalId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Vote>> {
        let votes = self
            .votes
            .iter()
            .skip_while(|((pid, _), _)| *pid < proposal_id)
            .take_while(|((pid, _), _)| *pid == proposal_id)
            .map(|(_, v)| v.clone());
        Ok(apply_window(votes, window))
    }

    fn votes_by_voter(&self, voter: &Address, window: QueryWindow) -> StorageResult<Vec<Vote>> {
        let votes = scan(&self.votes_by_voter, voter)
            .filter_map(|pid| self.votes.get(&(*pid, voter.clone())).cloned());
        Ok(apply_window(votes, window))
    }
}
