//! The group keeper and its transaction scope

use crate::context::BlockContext;
use crate::invariants::{InvariantEnforcer, InvariantViolation};
use crate::router::ActionRouter;
use chrono::{DateTime, Utc};
use group_store::{GroupStore, QueryWindow};
use group_types::{
    Address, GroupConfig, GroupError, GroupEvent, GroupId, GroupInfo, GroupPolicyInfo,
    GroupResult, Proposal, ProposalId,
};
use tracing::{debug, info};

/// The governance engine.
///
/// Operations take the [`BlockContext`] they execute in and either commit
/// all of their writes and events or none of them.
pub struct GroupKeeper<S, R> {
    pub(crate) store: S,
    pub(crate) router: R,
    pub(crate) config: GroupConfig,
    events: Vec<GroupEvent>,
}

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    pub fn new(store: S, router: R, config: GroupConfig) -> Self {
        info!(
            max_execution_period_secs = config.max_execution_period_secs,
            max_metadata_len = config.max_metadata_len,
            "Group keeper initialized"
        );
        Self {
            store,
            router,
            config,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Mutable access to the router between operations, for example to fix
    /// the condition that made a proposal's actions fail before retrying.
    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    /// Drain events emitted by committed operations, oldest first.
    pub fn take_events(&mut self) -> Vec<GroupEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run every registered state invariant against the committed store.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        InvariantEnforcer::with_group_invariants().check_all(&self.store)
    }

    /// Run `op` against a branch of the store and router.
    pub(crate) fn transact<T>(
        &mut self,
        ctx: &BlockContext,
        op: &'static str,
        f: impl FnOnce(&mut Txn<'_, S, R>) -> GroupResult<T>,
    ) -> GroupResult<T> {
        let mut txn = Txn {
            store: self.store.clone(),
            router: self.router.clone(),
            events: Vec::new(),
            config: &self.config,
            ctx,
        };

        let result = f(&mut txn);
        let commit = match &result {
            Ok(_) => true,
            Err(e) => e.commits_state(),
        };

        if commit {
            let Txn {
                store,
                router,
                events,
                ..
            } = txn;
            self.store = store;
            self.router = router;
            self.events.extend(events);
        }

        if let Err(e) = &result {
            debug!(
                op,
                height = ctx.height,
                kind = ?e.kind(),
                committed = commit,
                error = %e,
                "Operation failed"
            );
        }

        result
    }
}

/// Writable scope of a single keeper operation.
pub(crate) struct Txn<'k, S, R> {
    pub(crate) store: S,
    pub(crate) router: R,
    pub(crate) events: Vec<GroupEvent>,
    pub(crate) config: &'k GroupConfig,
    pub(crate) ctx: &'k BlockContext,
}

impl<S: GroupStore, R> Txn<'_, S, R> {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.ctx.time
    }

    pub(crate) fn emit(&mut self, event: GroupEvent) {
        self.events.push(event);
    }

    /// Delete every vote on a proposal.
    pub(crate) fn prune_votes(&mut self, proposal_id: ProposalId) -> GroupResult<()> {
        let votes = self
            .store
            .votes_by_proposal(proposal_id, QueryWindow::all())?;
        for vote in &votes {
            self.store.delete_vote(proposal_id, &vote.voter)?;
        }
        if !votes.is_empty() {
            debug!(proposal_id = %proposal_id, count = votes.len(), "Votes pruned");
        }
        Ok(())
    }

    /// Delete a proposal together with its votes.
    pub(crate) fn prune_proposal(&mut self, proposal: &Proposal) -> GroupResult<()> {
        self.prune_votes(proposal.id)?;
        self.store.delete_proposal(proposal.id)?;
        info!(
            proposal_id = %proposal.id,
            status = %proposal.status,
            "Proposal pruned"
        );
        self.emit(GroupEvent::ProposalPruned {
            proposal_id: proposal.id,
            status: proposal.status,
            tally_result: proposal.final_tally_result.clone(),
        });
        Ok(())
    }
}

pub(crate) fn load_group<S: GroupStore + ?Sized>(store: &S, id: GroupId) -> GroupResult<GroupInfo> {
    if id.value() == 0 {
        return Err(GroupError::Empty("group id"));
    }
    store
        .get_group(id)?
        .ok_or_else(|| GroupError::NotFound(format!("group {id}")))
}

pub(crate) fn load_policy<S: GroupStore + ?Sized>(
    store: &S,
    address: &Address,
) -> GroupResult<GroupPolicyInfo> {
    store
        .get_policy(address)?
        .ok_or_else(|| GroupError::NotFound(format!("group policy {address}")))
}

pub(crate) fn load_proposal<S: GroupStore + ?Sized>(
    store: &S,
    id: ProposalId,
) -> GroupResult<Proposal> {
    if id.value() == 0 {
        return Err(GroupError::Empty("proposal id"));
    }
    store
        .get_proposal(id)?
        .ok_or_else(|| GroupError::NotFound(format!("proposal {id}")))
}
