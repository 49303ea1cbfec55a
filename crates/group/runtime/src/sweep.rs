//! End-of-block sweep
//!
//! Closes proposals whose voting period has ended and prunes proposals that
//! can no longer be acted on.

use crate::context::BlockContext;
use crate::keeper::{load_group, load_policy, GroupKeeper, Txn};
use crate::proposals::stale_snapshot;
use crate::router::ActionRouter;
use group_store::GroupStore;
use group_types::{checked_add_duration, GroupResult, ProposalStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// What one sweep did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Open proposals given a final tally.
    pub closed: usize,
    /// Open proposals found stale and aborted.
    pub aborted: usize,
    /// Proposals deleted along with their votes.
    pub pruned: usize,
}

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    /// Run once per block after all other operations of the block.
    pub fn end_block(&mut self, ctx: &BlockContext) -> GroupResult<SweepSummary> {
        self.transact(ctx, "end_block", |tx| {
            let mut summary = SweepSummary::default();
            tx.tally_proposals_at_voting_period_end(&mut summary)?;
            tx.prune_expired_proposals(&mut summary)?;
            if summary != SweepSummary::default() {
                info!(
                    height = tx.ctx.height,
                    closed = summary.closed,
                    aborted = summary.aborted,
                    pruned = summary.pruned,
                    "End-of-block sweep"
                );
            }
            Ok(summary)
        })
    }
}

impl<S, R> Txn<'_, S, R>
where
    S: GroupStore,
    R: ActionRouter,
{
    fn tally_proposals_at_voting_period_end(&mut self, summary: &mut SweepSummary) -> GroupResult<()> {
        for mut proposal in self.store.proposals_by_voting_period_end(self.now())? {
            match proposal.status {
                ProposalStatus::Withdrawn | ProposalStatus::Aborted => {
                    self.prune_proposal(&proposal)?;
                    summary.pruned += 1;
                }
                ProposalStatus::Submitted => {
                    let policy = load_policy(&self.store, &proposal.group_policy_address)?;
                    let group = load_group(&self.store, policy.group_id)?;
                    // Stale proposals stay visible as aborted until the next sweep.
                    if let Some(stale) = stale_snapshot(&proposal, &group, &policy) {
                        self.abort_proposal(&mut proposal, &stale)?;
                        summary.aborted += 1;
                        continue;
                    }
                    self.tally_and_update(&mut proposal, &group, &policy)?;
                    self.store.update_proposal(proposal)?;
                    summary.closed += 1;
                }
                ProposalStatus::Accepted | ProposalStatus::Rejected => {}
            }
        }
        Ok(())
    }

    /// Delete proposals whose execution window has passed.
    fn prune_expired_proposals(&mut self, summary: &mut SweepSummary) -> GroupResult<()> {
        let max_execution_period = self.config.max_execution_period();
        for proposal in self.store.proposals_by_voting_period_end(self.now())? {
            let expires_at = checked_add_duration(proposal.voting_period_end, max_execution_period)?;
            if expires_at >= self.now() {
                continue;
            }
            debug!(
                proposal_id = %proposal.id,
                expired_at = %expires_at,
                "Execution window passed"
            );
            self.prune_proposal(&proposal)?;
            summary.pruned += 1;
        }
        Ok(())
    }
}
