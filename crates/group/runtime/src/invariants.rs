//! State invariants
//!
//! Each invariant inspects committed store state. A healthy engine never
//! violates any of them; the checks exist for hosts and tests to assert that
//! after arbitrary sequences of operations.

use crate::tally::tally_proposal;
use group_store::{GroupStore, QueryWindow, StorageError};
use group_types::{Dec, GroupResult, ProposalStatus, TallyResult};
use std::fmt;
use tracing::{debug, error};

/// A single broken invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub invariant_id: String,
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.invariant_id, self.message)
    }
}

pub trait Invariant {
    /// Unique invariant identifier.
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation>;
}

fn violation(invariant: &dyn Invariant, message: impl Into<String>) -> InvariantViolation {
    InvariantViolation {
        invariant_id: invariant.id().to_string(),
        message: message.into(),
    }
}

fn storage_violation(invariant: &dyn Invariant, err: StorageError) -> InvariantViolation {
    violation(invariant, format!("store read failed: {err}"))
}

/// A group's total weight equals the sum of its members' weights, and every
/// stored weight is positive.
pub struct GroupTotalWeightInvariant;

impl Invariant for GroupTotalWeightInvariant {
    fn id(&self) -> &str {
        "group-total-weight"
    }

    fn name(&self) -> &str {
        "Group total weight matches members"
    }

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation> {
        let groups = store
            .list_groups(QueryWindow::all())
            .map_err(|e| storage_violation(self, e))?;

        for group in groups {
            let members = store
                .members_by_group(group.id, QueryWindow::all())
                .map_err(|e| storage_violation(self, e))?;

            let mut sum = Dec::ZERO;
            for member in &members {
                if !member.weight().is_positive() {
                    return Err(violation(
                        self,
                        format!(
                            "member {} of group {} has non-positive weight {}",
                            member.address(),
                            group.id,
                            member.weight()
                        ),
                    ));
                }
                sum = sum
                    .checked_add(member.weight())
                    .map_err(|e| violation(self, e.to_string()))?;
            }

            if sum != group.total_weight {
                return Err(violation(
                    self,
                    format!(
                        "group {} total weight {} != member weight sum {}",
                        group.id, group.total_weight, sum
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// An open proposal's tally never exceeds its group's total weight.
pub struct TallyWithinTotalWeightInvariant;

impl Invariant for TallyWithinTotalWeightInvariant {
    fn id(&self) -> &str {
        "tally-within-total-weight"
    }

    fn name(&self) -> &str {
        "Open tallies fit within group weight"
    }

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation> {
        for_each_proposal(store, self, |store, proposal| {
            if proposal.status != ProposalStatus::Submitted {
                return Ok(None);
            }
            let Some(policy) = store.get_policy(&proposal.group_policy_address)? else {
                return Ok(Some(format!(
                    "proposal {} references missing policy {}",
                    proposal.id, proposal.group_policy_address
                )));
            };
            let Some(group) = store.get_group(policy.group_id)? else {
                return Ok(Some(format!("policy {} has no group", policy.address)));
            };
            let counted = tally_proposal(store, proposal, group.id)?.total_counts()?;
            if counted > group.total_weight {
                return Ok(Some(format!(
                    "proposal {} tallies {} of group {} weight {}",
                    proposal.id, counted, group.id, group.total_weight
                )));
            }
            Ok(None)
        })
    }
}

/// An open proposal's tally equals the weighted sum of its members' votes
/// as found through the member listing and the per-voter vote index.
pub struct TallyVotesSumInvariant;

impl Invariant for TallyVotesSumInvariant {
    fn id(&self) -> &str {
        "tally-votes-sum"
    }

    fn name(&self) -> &str {
        "Open tallies equal weighted vote sums"
    }

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation> {
        for_each_proposal(store, self, |store, proposal| {
            if proposal.status != ProposalStatus::Submitted {
                return Ok(None);
            }
            let Some(policy) = store.get_policy(&proposal.group_policy_address)? else {
                return Ok(None);
            };

            let mut expected = TallyResult::zero();
            for member in store.members_by_group(policy.group_id, QueryWindow::all())? {
                let vote = store
                    .votes_by_voter(member.address(), QueryWindow::all())?
                    .into_iter()
                    .find(|v| v.proposal_id == proposal.id);
                if let Some(vote) = vote {
                    expected.add(vote.option, member.weight())?;
                }
            }

            let tally = tally_proposal(store, proposal, policy.group_id)?;
            if tally != expected {
                return Ok(Some(format!(
                    "proposal {} tally {:?} != member vote sum {:?}",
                    proposal.id, tally, expected
                )));
            }
            Ok(None)
        })
    }
}

/// Proposals closed by a final tally hold no votes.
pub struct ClosedProposalVotesPrunedInvariant;

impl Invariant for ClosedProposalVotesPrunedInvariant {
    fn id(&self) -> &str {
        "closed-proposal-votes-pruned"
    }

    fn name(&self) -> &str {
        "Votes pruned after final tally"
    }

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation> {
        for_each_proposal(store, self, |store, proposal| {
            if !proposal.status.is_closed() {
                return Ok(None);
            }
            let votes = store.votes_by_proposal(proposal.id, QueryWindow::page(0, 1))?;
            if !votes.is_empty() {
                return Ok(Some(format!(
                    "{} proposal {} still has votes",
                    proposal.status, proposal.id
                )));
            }
            Ok(None)
        })
    }
}

/// A proposal never pins a version newer than its group or policy.
pub struct PinnedVersionsInvariant;

impl Invariant for PinnedVersionsInvariant {
    fn id(&self) -> &str {
        "pinned-versions"
    }

    fn name(&self) -> &str {
        "Proposal versions bounded by current versions"
    }

    fn check(&self, store: &dyn GroupStore) -> Result<(), InvariantViolation> {
        for_each_proposal(store, self, |store, proposal| {
            let Some(policy) = store.get_policy(&proposal.group_policy_address)? else {
                return Ok(Some(format!(
                    "proposal {} references missing policy {}",
                    proposal.id, proposal.group_policy_address
                )));
            };
            if proposal.group_policy_version > policy.version {
                return Ok(Some(format!(
                    "proposal {} pins policy version {} > {}",
                    proposal.id, proposal.group_policy_version, policy.version
                )));
            }
            if let Some(group) = store.get_group(policy.group_id)? {
                if proposal.group_version > group.version {
                    return Ok(Some(format!(
                        "proposal {} pins group version {} > {}",
                        proposal.id, proposal.group_version, group.version
                    )));
                }
            }
            Ok(None)
        })
    }
}

/// Visit every proposal of every policy of every group. `visit` returns a
/// violation message or `None`.
fn for_each_proposal(
    store: &dyn GroupStore,
    invariant: &dyn Invariant,
    mut visit: impl FnMut(&dyn GroupStore, &group_types::Proposal) -> GroupResult<Option<String>>,
) -> Result<(), InvariantViolation> {
    let groups = store
        .list_groups(QueryWindow::all())
        .map_err(|e| storage_violation(invariant, e))?;
    for group in groups {
        let policies = store
            .policies_by_group(group.id, QueryWindow::all())
            .map_err(|e| storage_violation(invariant, e))?;
        for policy in policies {
            let proposals = store
                .proposals_by_policy(&policy.address, QueryWindow::all())
                .map_err(|e| storage_violation(invariant, e))?;
            for proposal in &proposals {
                match visit(store, proposal) {
                    Ok(None) => {}
                    Ok(Some(message)) => return Err(violation(invariant, message)),
                    Err(e) => return Err(violation(invariant, e.to_string())),
                }
            }
        }
    }
    Ok(())
}

/// Runs a set of invariants.
pub struct InvariantEnforcer {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantEnforcer {
    /// Create an empty enforcer (no invariants loaded).
    pub fn new() -> Self {
        Self {
            invariants: Vec::new(),
        }
    }

    /// Create an enforcer with every group state invariant.
    pub fn with_group_invariants() -> Self {
        let mut enforcer = Self::new();
        enforcer.register(Box::new(GroupTotalWeightInvariant));
        enforcer.register(Box::new(TallyWithinTotalWeightInvariant));
        enforcer.register(Box::new(TallyVotesSumInvariant));
        enforcer.register(Box::new(ClosedProposalVotesPrunedInvariant));
        enforcer.register(Box::new(PinnedVersionsInvariant));
        enforcer
    }

    pub fn register(&mut self, invariant: Box<dyn Invariant>) {
        debug!(id = invariant.id(), name = invariant.name(), "Invariant registered");
        self.invariants.push(invariant);
    }

    /// Check all invariants. Returns the violations (empty if all pass).
    pub fn check_all(&self, store: &dyn GroupStore) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        for invariant in &self.invariants {
            match invariant.check(store) {
                Ok(()) => debug!(id = invariant.id(), "Invariant holds"),
                Err(v) => {
                    error!(id = invariant.id(), message = %v.message, "INVARIANT VIOLATION");
                    violations.push(v);
                }
            }
        }
        violations
    }

    pub fn enforce(&self, store: &dyn GroupStore) -> Result<(), Vec<InvariantViolation>> {
        let violations = self.check_all(store);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Number of registered invariants.
    pub fn count(&self) -> usize {
        self.invariants.len()
    }
}

impl Default for InvariantEnforcer {
    fn default() -> Self {
        Self::new()
    }
}
