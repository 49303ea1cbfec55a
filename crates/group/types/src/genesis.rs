//! Whole-state snapshot for export and import.

use crate::{
    Address, Dec, GroupError, GroupId, GroupInfo, GroupMember, GroupPolicyInfo, GroupResult,
    Proposal, ProposalId, Vote,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Every record of the group state plus the sequence counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupGenesis {
    /// Last group id handed out.
    pub group_seq: u64,
    /// Last policy address sequence handed out.
    pub group_policy_seq: u64,
    /// Last proposal id handed out.
    pub proposal_seq: u64,
    pub groups: Vec<GroupInfo>,
    pub group_members: Vec<GroupMember>,
    pub group_policies: Vec<GroupPolicyInfo>,
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

fn invalid(message: String) -> GroupError {
    GroupError::Invalid(message)
}

impl GroupGenesis {
    /// Check every record on its own and against the records it references.
    pub fn validate(&self) -> GroupResult<()> {
        let groups = self.validate_groups()?;
        self.validate_members(&groups)?;
        let policies = self.validate_policies(&groups)?;
        let proposals = self.validate_proposals(&groups, &policies)?;
        self.validate_votes(&proposals)
    }

    fn validate_groups(&self) -> GroupResult<BTreeMap<GroupId, &GroupInfo>> {
        let mut groups = BTreeMap::new();
        for group in &self.groups {
            if group.id.value() == 0 {
                return Err(GroupError::Empty("group id"));
            }
            if group.id.value() > self.group_seq {
                return Err(invalid(format!(
                    "group {} is above the group sequence {}",
                    group.id, self.group_seq
                )));
            }
            if group.version == 0 {
                return Err(invalid(format!("group {} has version 0", group.id)));
            }
            if group.total_weight.is_negative() {
                return Err(invalid(format!(
                    "group {} has negative total weight {}",
                    group.id, group.total_weight
                )));
            }
            if groups.insert(group.id, group).is_some() {
                return Err(GroupError::Duplicate(format!("group {}", group.id)));
            }
        }
        Ok(groups)
    }

    fn validate_members(&self, groups: &BTreeMap<GroupId, &GroupInfo>) -> GroupResult<()> {
        let mut seen = BTreeSet::new();
        let mut sums: BTreeMap<GroupId, Dec> = BTreeMap::new();
        for member in &self.group_members {
            if member.group_id.value() == 0 {
                return Err(GroupError::Empty("member group id"));
            }
            if !groups.contains_key(&member.group_id) {
                return Err(invalid(format!(
                    "member {} references unknown group {}",
                    member.address(),
                    member.group_id
                )));
            }
            if !member.weight().is_positive() {
                return Err(invalid(format!(
                    "member {} of group {} has non-positive weight {}",
                    member.address(),
                    member.group_id,
                    member.weight()
                )));
            }
            if !seen.insert((member.group_id, member.address())) {
                return Err(GroupError::Duplicate(format!(
                    "member {} of group {}",
                    member.address(),
                    member.group_id
                )));
            }
            let sum = sums.entry(member.group_id).or_insert(Dec::ZERO);
            *sum = sum.checked_add(member.weight())?;
        }

        for (id, group) in groups {
            let sum = sums.get(id).copied().unwrap_or(Dec::ZERO);
            if sum != group.total_weight {
                return Err(invalid(format!(
                    "group {id} total weight {} != member weight sum {sum}",
                    group.total_weight
                )));
            }
        }
        Ok(())
    }

    fn validate_policies(
        &self,
        groups: &BTreeMap<GroupId, &GroupInfo>,
    ) -> GroupResult<BTreeMap<&Address, &GroupPolicyInfo>> {
        let mut policies = BTreeMap::new();
        for policy in &self.group_policies {
            if !groups.contains_key(&policy.group_id) {
                return Err(invalid(format!(
                    "group policy {} references unknown group {}",
                    policy.address, policy.group_id
                )));
            }
            if policy.version == 0 {
                return Err(invalid(format!(
                    "group policy {} has version 0",
                    policy.address
                )));
            }
            policy.decision_policy.validate_basic()?;
            if policies.insert(&policy.address, policy).is_some() {
                return Err(GroupError::Duplicate(format!(
                    "group policy {}",
                    policy.address
                )));
            }
        }
        Ok(policies)
    }

    fn validate_proposals(
        &self,
        groups: &BTreeMap<GroupId, &GroupInfo>,
        policies: &BTreeMap<&Address, &GroupPolicyInfo>,
    ) -> GroupResult<BTreeMap<ProposalId, &Proposal>> {
        let mut proposals = BTreeMap::new();
        for proposal in &self.proposals {
            let id = proposal.id;
            if id.value() == 0 {
                return Err(GroupError::Empty("proposal id"));
            }
            if id.value() > self.proposal_seq {
                return Err(invalid(format!(
                    "proposal {id} is above the proposal sequence {}",
                    self.proposal_seq
                )));
            }
            if proposal.proposers.is_empty() {
                return Err(GroupError::Empty("proposers"));
            }
            let policy = policies.get(&proposal.group_policy_address).ok_or_else(|| {
                invalid(format!(
                    "proposal {id} references unknown group policy {}",
                    proposal.group_policy_address
                ))
            })?;
            let group = groups.get(&policy.group_id).ok_or_else(|| {
                invalid(format!("group policy {} has no group", policy.address))
            })?;

            if proposal.group_version == 0 || proposal.group_version > group.version {
                return Err(invalid(format!(
                    "proposal {id} pins group version {} outside 1..={}",
                    proposal.group_version, group.version
                )));
            }
            if proposal.group_policy_version == 0
                || proposal.group_policy_version > policy.version
            {
                return Err(invalid(format!(
                    "proposal {id} pins group policy version {} outside 1..={}",
                    proposal.group_policy_version, policy.version
                )));
            }
            if proposal.voting_period_end <= proposal.submit_time {
                return Err(invalid(format!(
                    "proposal {id} voting period ends at or before submission"
                )));
            }
            let tally = &proposal.final_tally_result;
            if [
                tally.yes_count,
                tally.no_count,
                tally.abstain_count,
                tally.no_with_veto_count,
            ]
            .iter()
            .any(Dec::is_negative)
            {
                return Err(invalid(format!(
                    "proposal {id} has a negative final tally count"
                )));
            }
            if proposals.insert(id, proposal).is_some() {
                return Err(GroupError::Duplicate(format!("proposal {id}")));
            }
        }
        Ok(proposals)
    }

    fn validate_votes(&self, proposals: &BTreeMap<ProposalId, &Proposal>) -> GroupResult<()> {
        let mut seen = BTreeSet::new();
        for vote in &self.votes {
            let proposal = proposals.get(&vote.proposal_id).ok_or_else(|| {
                invalid(format!(
                    "vote by {} references unknown proposal {}",
                    vote.voter, vote.proposal_id
                ))
            })?;
            if proposal.status.is_closed() {
                return Err(invalid(format!(
                    "vote by {} on {} proposal {}",
                    vote.voter, proposal.status, proposal.id
                )));
            }
            if !seen.insert((vote.proposal_id, &vote.voter)) {
                return Err(GroupError::Duplicate(format!(
                    "vote by {} on proposal {}",
                    vote.voter, vote.proposal_id
                )));
            }
        }
        Ok(())
    }
}
