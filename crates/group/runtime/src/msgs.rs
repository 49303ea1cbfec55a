//! Request and response types for keeper operations

use group_types::{
    Action, Address, DecisionPolicy, Exec, GroupId, MemberRequest, ProposalExecutorResult,
    ProposalId, VoteOption,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub admin: Address,
    pub members: Vec<MemberRequest>,
    #[serde(default)]
    pub metadata: String,
}

/// Create a group and its first policy in one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupWithPolicyRequest {
    pub admin: Address,
    pub members: Vec<MemberRequest>,
    #[serde(default)]
    pub group_metadata: String,
    #[serde(default)]
    pub group_policy_metadata: String,
    /// Hand admin rights over both the group and the policy to the policy
    /// account itself.
    #[serde(default)]
    pub group_policy_as_admin: bool,
    pub decision_policy: DecisionPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupWithPolicyResponse {
    pub group_id: GroupId,
    pub group_policy_address: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupPolicyRequest {
    pub admin: Address,
    pub group_id: GroupId,
    #[serde(default)]
    pub metadata: String,
    pub decision_policy: DecisionPolicy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitProposalRequest {
    pub group_policy_address: Address,
    pub proposers: Vec<Address>,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub exec: Exec,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl SubmitProposalRequest {
    pub fn new(group_policy_address: Address, proposers: Vec<Address>) -> Self {
        Self {
            group_policy_address,
            proposers,
            metadata: String::new(),
            actions: Vec::new(),
            exec: Exec::Unspecified,
            title: String::new(),
            summary: String::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_exec(mut self, exec: Exec) -> Self {
        self.exec = exec;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>, summary: impl Into<String>) -> Self {
        self.title = title.into();
        self.summary = summary.into();
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub option: VoteOption,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub exec: Exec,
}

impl VoteRequest {
    pub fn new(proposal_id: ProposalId, voter: Address, option: VoteOption) -> Self {
        Self {
            proposal_id,
            voter,
            option,
            metadata: String::new(),
            exec: Exec::Unspecified,
        }
    }

    pub fn with_exec(mut self, exec: Exec) -> Self {
        self.exec = exec;
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResponse {
    pub result: ProposalExecutorResult,
    /// Failure details when `result` is `Failure`, otherwise empty.
    pub logs: String,
}
