//! Events emitted by committed operations

use crate::{
    Address, GroupId, ProposalExecutorResult, ProposalId, ProposalStatus, TallyResult,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupEvent {
    CreateGroup {
        group_id: GroupId,
    },
    UpdateGroup {
        group_id: GroupId,
    },
    CreateGroupPolicy {
        address: Address,
    },
    UpdateGroupPolicy {
        address: Address,
    },
    SubmitProposal {
        proposal_id: ProposalId,
    },
    WithdrawProposal {
        proposal_id: ProposalId,
    },
    Vote {
        proposal_id: ProposalId,
    },
    Exec {
        proposal_id: ProposalId,
        result: ProposalExecutorResult,
        logs: String,
    },
    LeaveGroup {
        group_id: GroupId,
        address: Address,
    },
    ProposalPruned {
        proposal_id: ProposalId,
        status: ProposalStatus,
        tally_result: TallyResult,
    },
}
