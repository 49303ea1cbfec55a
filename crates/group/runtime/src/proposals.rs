//! Proposal lifecycle: submit, withdraw, vote, execute

use crate::context::BlockContext;
use crate::executor::Executor;
use crate::keeper::{load_group, load_policy, load_proposal, GroupKeeper, Txn};
use crate::msgs::{ExecResponse, SubmitProposalRequest, VoteRequest};
use crate::router::ActionRouter;
use crate::tally::tally_proposal;
use crate::validation::{
    assert_length, assert_metadata_length, check_proposal_metadata, validate_proposers,
};
use group_store::{GroupStore, StorageError};
use group_types::{
    checked_add_duration, ensure_actions_authz, Address, Exec, GroupError, GroupEvent,
    GroupInfo, GroupPolicyInfo, GroupResult, Proposal, ProposalExecutorResult, ProposalId,
    ProposalStatus, TallyResult, Vote, VoteOption,
};
use tracing::{debug, info, warn};

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    pub fn submit_proposal(
        &mut self,
        ctx: &BlockContext,
        req: SubmitProposalRequest,
    ) -> GroupResult<ProposalId> {
        self.transact(ctx, "submit_proposal", |tx| tx.submit_proposal(req))
    }

    /// Withdraw an open proposal. Allowed for its proposers and the policy
    /// admin.
    pub fn withdraw_proposal(
        &mut self,
        ctx: &BlockContext,
        proposal_id: ProposalId,
        address: &Address,
    ) -> GroupResult<()> {
        self.transact(ctx, "withdraw_proposal", |tx| {
            tx.withdraw_proposal(proposal_id, address)
        })
    }

    pub fn vote(&mut self, ctx: &BlockContext, req: VoteRequest) -> GroupResult<()> {
        self.transact(ctx, "vote", |tx| tx.vote(req))
    }

    /// Tally an open proposal and, if it is accepted, run its actions.
    pub fn exec(
        &mut self,
        ctx: &BlockContext,
        proposal_id: ProposalId,
        executor: &Address,
    ) -> GroupResult<ExecResponse> {
        self.transact(ctx, "exec", |tx| tx.exec(proposal_id, executor))
    }
}

impl<S, R> Txn<'_, S, R>
where
    S: GroupStore,
    R: ActionRouter,
{
    pub(crate) fn submit_proposal(&mut self, req: SubmitProposalRequest) -> GroupResult<ProposalId> {
        validate_proposers(&req.proposers)?;
        assert_length(&req.title, "proposal title", self.config.max_proposal_title_len)?;
        assert_length(
            &req.summary,
            "proposal summary",
            self.config.max_proposal_summary_len,
        )?;
        assert_metadata_length(self.config, &req.metadata, "proposal metadata")?;
        check_proposal_metadata(&req.metadata, &req.title, &req.summary)?;
        for action in &req.actions {
            action.validate_basic()?;
        }

        let policy = load_policy(&self.store, &req.group_policy_address)?;
        let group = load_group(&self.store, policy.group_id)?;

        for proposer in &req.proposers {
            if self.store.get_member(group.id, proposer)?.is_none() {
                return Err(GroupError::Unauthorized(format!(
                    "proposer {proposer} is not a member of group {}",
                    group.id
                )));
            }
        }

        ensure_actions_authz(&req.actions, &policy.address)?;
        policy.decision_policy.validate(&group, self.config)?;

        let proposal_id = self.store.next_proposal_id()?;
        let voting_period_end =
            checked_add_duration(self.now(), policy.decision_policy.voting_period())?;

        let proposal = Proposal {
            id: proposal_id,
            group_policy_address: policy.address.clone(),
            metadata: req.metadata,
            proposers: req.proposers,
            submit_time: self.now(),
            group_version: group.version,
            group_policy_version: policy.version,
            status: ProposalStatus::Submitted,
            final_tally_result: TallyResult::zero(),
            voting_period_end,
            executor_result: ProposalExecutorResult::NotRun,
            actions: req.actions,
            title: req.title,
            summary: req.summary,
        };
        let proposers = proposal.proposers.clone();
        self.store.create_proposal(proposal)?;

        info!(
            proposal_id = %proposal_id,
            policy = %policy.address,
            group_id = %group.id,
            voting_period_end = %voting_period_end,
            "Proposal submitted"
        );
        self.emit(GroupEvent::SubmitProposal { proposal_id });

        if req.exec == Exec::Try {
            for proposer in &proposers {
                // An early final tally closes voting for the remaining proposers.
                if load_proposal(&self.store, proposal_id)?.status != ProposalStatus::Submitted {
                    break;
                }
                self.vote(VoteRequest::new(proposal_id, proposer.clone(), VoteOption::Yes))?;
            }
            if let Some(executor) = proposers.first() {
                self.try_exec(proposal_id, executor)?;
            }
        }

        Ok(proposal_id)
    }

    pub(crate) fn withdraw_proposal(
        &mut self,
        proposal_id: ProposalId,
        address: &Address,
    ) -> GroupResult<()> {
        let mut proposal = load_proposal(&self.store, proposal_id)?;
        if proposal.status != ProposalStatus::Submitted {
            return Err(GroupError::InvalidState(format!(
                "cannot withdraw a proposal with status {}",
                proposal.status
            )));
        }

        let policy = load_policy(&self.store, &proposal.group_policy_address)?;
        if &policy.admin != address && !proposal.is_proposer(address) {
            return Err(GroupError::Unauthorized(format!(
                "{address} is neither the group policy admin nor a proposer"
            )));
        }

        proposal.status = ProposalStatus::Withdrawn;
        self.store.update_proposal(proposal)?;

        info!(proposal_id = %proposal_id, by = %address, "Proposal withdrawn");
        self.emit(GroupEvent::WithdrawProposal { proposal_id });
        Ok(())
    }

    pub(crate) fn vote(&mut self, req: VoteRequest) -> GroupResult<()> {
        assert_metadata_length(self.config, &req.metadata, "vote metadata")?;

        let mut proposal = load_proposal(&self.store, req.proposal_id)?;
        if proposal.status != ProposalStatus::Submitted {
            return Err(GroupError::InvalidState(format!(
                "proposal {} not open for voting",
                proposal.id
            )));
        }
        if self.now() >= proposal.voting_period_end {
            return Err(GroupError::Expired(format!(
                "voting period of proposal {} has ended",
                proposal.id
            )));
        }

        let policy = load_policy(&self.store, &proposal.group_policy_address)?;
        let group = load_group(&self.store, policy.group_id)?;
        self.ensure_current(&mut proposal, &group, &policy)?;

        if self.store.get_member(group.id, &req.voter)?.is_none() {
            return Err(GroupError::Unauthorized(format!(
                "voter {} is not a member of group {}",
                req.voter, group.id
            )));
        }

        let vote = Vote {
            proposal_id: proposal.id,
            voter: req.voter.clone(),
            option: req.option,
            metadata: req.metadata,
            submit_time: self.now(),
        };
        self.store.create_vote(vote).map_err(|e| match e {
            StorageError::Conflict(_) => GroupError::AlreadyVoted {
                proposal_id: proposal.id,
                voter: req.voter.clone(),
            },
            other => other.into(),
        })?;
        debug!(
            proposal_id = %proposal.id,
            voter = %req.voter,
            option = %req.option,
            "Vote recorded"
        );

        self.tally_and_update(&mut proposal, &group, &policy)?;
        self.store.update_proposal(proposal)?;
        self.emit(GroupEvent::Vote {
            proposal_id: req.proposal_id,
        });

        if req.exec == Exec::Try {
            self.try_exec(req.proposal_id, &req.voter)?;
        }
        Ok(())
    }

    pub(crate) fn exec(
        &mut self,
        proposal_id: ProposalId,
        executor: &Address,
    ) -> GroupResult<ExecResponse> {
        let mut proposal = load_proposal(&self.store, proposal_id)?;
        if !matches!(
            proposal.status,
            ProposalStatus::Submitted | ProposalStatus::Accepted
        ) {
            return Err(GroupError::InvalidState(format!(
                "cannot execute a proposal with status {}",
                proposal.status
            )));
        }

        let policy = load_policy(&self.store, &proposal.group_policy_address)?;

        if proposal.status == ProposalStatus::Submitted {
            let group = load_group(&self.store, policy.group_id)?;
            self.ensure_current(&mut proposal, &group, &policy)?;
            self.tally_and_update(&mut proposal, &group, &policy)?;
        }

        let mut logs = String::new();
        if proposal.status == ProposalStatus::Accepted
            && proposal.executor_result != ProposalExecutorResult::Success
        {
            let executable_at = checked_add_duration(
                proposal.submit_time,
                policy.decision_policy.min_execution_period(),
            )?;
            if self.now() < executable_at {
                // Keep the tally outcome for callers that continue past this error.
                self.store.update_proposal(proposal)?;
                return Err(GroupError::NotExecutableYet {
                    proposal_id,
                    executable_at,
                });
            }

            match Executor::new(&mut self.router).execute(&proposal.actions, &policy.address) {
                Ok(responses) => {
                    proposal.executor_result = ProposalExecutorResult::Success;
                    info!(
                        proposal_id = %proposal_id,
                        executor = %executor,
                        actions = responses.len(),
                        "Proposal executed"
                    );
                }
                Err(e) => {
                    proposal.executor_result = ProposalExecutorResult::Failure;
                    logs = format!("proposal execution failed on proposal {proposal_id}: {e}");
                    warn!(
                        proposal_id = %proposal_id,
                        executor = %executor,
                        error = %e,
                        "Proposal execution failed"
                    );
                }
            }
        }

        let result = proposal.executor_result;
        if result == ProposalExecutorResult::Success {
            self.prune_proposal(&proposal)?;
        } else {
            self.store.update_proposal(proposal)?;
        }

        self.emit(GroupEvent::Exec {
            proposal_id,
            result,
            logs: logs.clone(),
        });
        Ok(ExecResponse { result, logs })
    }

    /// Execute as part of another operation, leaving a proposal that is not
    /// executable yet for a later call.
    fn try_exec(&mut self, proposal_id: ProposalId, executor: &Address) -> GroupResult<()> {
        match self.exec(proposal_id, executor) {
            Ok(_) => Ok(()),
            Err(GroupError::NotExecutableYet { executable_at, .. }) => {
                debug!(
                    proposal_id = %proposal_id,
                    executable_at = %executable_at,
                    "Execution deferred"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Tally with current weights and close the proposal when the decision
    /// is final or its voting period is over.
    pub(crate) fn tally_and_update(
        &mut self,
        proposal: &mut Proposal,
        group: &GroupInfo,
        policy: &GroupPolicyInfo,
    ) -> GroupResult<()> {
        let tally = tally_proposal(&self.store, proposal, group.id)?;
        let result = policy.decision_policy.allow(&tally, group.total_weight)?;
        let voting_over = self.now() >= proposal.voting_period_end;

        if result.is_final || voting_over {
            self.prune_votes(proposal.id)?;
            proposal.final_tally_result = tally;
            proposal.status = if result.allow {
                ProposalStatus::Accepted
            } else {
                ProposalStatus::Rejected
            };
            info!(
                proposal_id = %proposal.id,
                status = %proposal.status,
                yes = %proposal.final_tally_result.yes_count,
                total_weight = %group.total_weight,
                early = result.is_final,
                "Proposal closed"
            );
        }
        Ok(())
    }

    /// Abort the proposal if its group or policy changed since submission.
    ///
    /// The abort is persisted and the returned error marks the operation
    /// for commit.
    pub(crate) fn ensure_current(
        &mut self,
        proposal: &mut Proposal,
        group: &GroupInfo,
        policy: &GroupPolicyInfo,
    ) -> GroupResult<()> {
        let Some(stale) = stale_snapshot(proposal, group, policy) else {
            return Ok(());
        };
        self.abort_proposal(proposal, &stale)?;
        Err(GroupError::Modified(stale))
    }

    pub(crate) fn abort_proposal(&mut self, proposal: &mut Proposal, reason: &str) -> GroupResult<()> {
        proposal.status = ProposalStatus::Aborted;
        self.store.update_proposal(proposal.clone())?;
        warn!(proposal_id = %proposal.id, modified = reason, "Proposal aborted");
        Ok(())
    }
}

/// Name of the record whose version moved since the proposal was submitted.
pub(crate) fn stale_snapshot(
    proposal: &Proposal,
    group: &GroupInfo,
    policy: &GroupPolicyInfo,
) -> Option<String> {
    if proposal.group_policy_version != policy.version {
        return Some(format!("group policy {}", policy.address));
    }
    if proposal.group_version != group.version {
        return Some(format!("group {}", group.id));
    }
    None
}
