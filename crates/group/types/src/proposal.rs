//! Proposals and votes

use crate::{Action, Address, ProposalId, TallyResult, VoteOption};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a proposal.
///
/// `Submitted` is the only open state. `Accepted` and `Rejected` are the two
/// closed outcomes of a final tally. `Withdrawn` and `Aborted` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Submitted,
    Accepted,
    Rejected,
    Withdrawn,
    Aborted,
}

impl ProposalStatus {
    /// Closed by a final tally.
    pub fn is_closed(&self) -> bool {
        matches!(self, ProposalStatus::Accepted | ProposalStatus::Rejected)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalStatus::Submitted => "submitted",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Withdrawn => "withdrawn",
            ProposalStatus::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

/// Outcome of running a proposal's actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalExecutorResult {
    #[default]
    NotRun,
    Success,
    Failure,
}

impl fmt::Display for ProposalExecutorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalExecutorResult::NotRun => "not_run",
            ProposalExecutorResult::Success => "success",
            ProposalExecutorResult::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// Whether to attempt execution right after submitting or voting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exec {
    #[default]
    Unspecified,
    /// Try to execute immediately. A proposal that is not yet executable is
    /// left for a later `exec` call.
    Try,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub group_policy_address: Address,
    pub metadata: String,
    pub proposers: Vec<Address>,
    pub submit_time: DateTime<Utc>,
    /// Group version when the proposal was submitted.
    pub group_version: u64,
    /// Policy version when the proposal was submitted.
    pub group_policy_version: u64,
    pub status: ProposalStatus,
    /// Zero until the proposal closes.
    pub final_tally_result: TallyResult,
    pub voting_period_end: DateTime<Utc>,
    pub executor_result: ProposalExecutorResult,
    pub actions: Vec<Action>,
    pub title: String,
    pub summary: String,
}

impl Proposal {
    pub fn is_proposer(&self, address: &Address) -> bool {
        self.proposers.contains(address)
    }
}

/// A single member's vote on a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub option: VoteOption,
    pub metadata: String,
    pub submit_time: DateTime<Utc>,
}

