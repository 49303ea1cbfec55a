mod common;

use common::*;
use group_runtime::{SubmitProposalRequest, VoteRequest};
use group_store::QueryWindow;
use group_types::{
    Dec, ErrorKind, Exec, GroupError, GroupEvent, MemberRequest, ProposalExecutorResult,
    ProposalStatus, TallyResult, VoteOption,
};

#[test]
fn test_votes_reach_threshold_and_execute() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2"), ("carol", "1")], threshold("3"));
    let req = SubmitProposalRequest::new(h.policy.clone(), vec![addr("alice")])
        .with_action(send(&h.policy, "carol", 40));
    let id = h.submit_with(req);

    h.vote(id, "alice", VoteOption::Yes);
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Submitted);

    h.vote(id, "bob", VoteOption::Yes);
    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Accepted);
    assert_eq!(proposal.final_tally_result.yes_count, Dec::from_u64(3));
    assert!(h
        .keeper
        .votes_by_proposal(id, QueryWindow::all())
        .unwrap()
        .is_empty());
    h.assert_invariants();

    let res = h.keeper.exec(&h.ctx, id, &addr("carol")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Success);
    assert!(res.logs.is_empty());
    assert_eq!(h.keeper.router().balance("carol"), 40);
    assert_eq!(h.keeper.router().balance(h.policy.as_str()), 60);

    // Executed proposals are pruned right away.
    assert!(matches!(
        h.keeper.proposal(id),
        Err(GroupError::NotFound(_))
    ));
    let events = h.keeper.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GroupEvent::ProposalPruned { proposal_id, status: ProposalStatus::Accepted, .. } if *proposal_id == id
    )));
    h.assert_invariants();
}

#[test]
fn test_early_rejection_when_threshold_is_out_of_reach() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2"), ("carol", "1")], threshold("3"));
    let id = h.submit(&["alice"]);

    h.vote(id, "carol", VoteOption::No);
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Submitted);

    // yes (0) + undecided (1) can no longer reach 3
    h.vote(id, "bob", VoteOption::NoWithVeto);
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Rejected);

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("alice"), VoteOption::Yes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn test_deadline_forces_final_tally() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2"), ("carol", "1")], threshold("3"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);

    h.advance(VOTING_PERIOD_SECS);
    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("bob"), VoteOption::Yes))
        .unwrap_err();
    assert!(matches!(err, GroupError::Expired(_)));

    let summary = h.keeper.end_block(&h.ctx).unwrap();
    assert_eq!(summary.closed, 1);

    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Rejected);
    assert_eq!(proposal.final_tally_result.yes_count, Dec::ONE);
    assert!(h
        .keeper
        .votes_by_voter(&addr("alice"), QueryWindow::all())
        .unwrap()
        .is_empty());

    let err = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap_err();
    assert!(matches!(err, GroupError::InvalidState(_)));
    h.assert_invariants();
}

#[test]
fn test_withdrawn_proposal_accepts_no_further_action() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2")], threshold("2"));
    let id = h.submit(&["alice"]);

    let err = h
        .keeper
        .withdraw_proposal(&h.ctx, id, &addr("bob"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    h.keeper.withdraw_proposal(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Withdrawn);

    let vote = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("bob"), VoteOption::Yes));
    assert!(matches!(vote, Err(GroupError::InvalidState(_))));
    assert!(matches!(
        h.keeper.exec(&h.ctx, id, &addr("bob")),
        Err(GroupError::InvalidState(_))
    ));
    assert!(matches!(
        h.keeper.withdraw_proposal(&h.ctx, id, &addr("alice")),
        Err(GroupError::InvalidState(_))
    ));
    assert!(matches!(
        h.keeper.tally_result(id),
        Err(GroupError::InvalidState(_))
    ));

    h.advance(VOTING_PERIOD_SECS);
    let summary = h.keeper.end_block(&h.ctx).unwrap();
    assert_eq!(summary.pruned, 1);
    assert!(h.keeper.proposal(id).is_err());
}

#[test]
fn test_policy_admin_can_withdraw() {
    let mut h = Harness::new(&[("alice", "1")], threshold("1"));
    let id = h.submit(&["alice"]);
    let admin = h.admin.clone();
    h.keeper.withdraw_proposal(&h.ctx, id, &admin).unwrap();
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Withdrawn);
}

#[test]
fn test_group_change_aborts_on_next_touch() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2")], threshold("3"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);

    let admin = h.admin.clone();
    h.keeper
        .update_group_metadata(&h.ctx, &admin, h.group_id, "renamed".into())
        .unwrap();
    // Group changes do not touch proposals eagerly.
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Submitted);

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("bob"), VoteOption::Yes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert!(matches!(err, GroupError::Modified(_)));

    // The abort was committed even though the vote failed.
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Aborted);
    assert!(h
        .keeper
        .vote_by_proposal_voter(id, &addr("bob"))
        .is_err());

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("bob"), VoteOption::Yes))
        .unwrap_err();
    assert!(matches!(err, GroupError::InvalidState(_)));
    h.assert_invariants();
}

#[test]
fn test_exec_on_stale_proposal_aborts_it() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "1")], threshold("2"));
    let id = h.submit(&["alice"]);

    let admin = h.admin.clone();
    h.keeper
        .update_group_admin(&h.ctx, &admin, h.group_id, addr("newadmin"))
        .unwrap();

    let err = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap_err();
    assert!(err.commits_state());
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Aborted);
}

#[test]
fn test_membership_change_aborts_in_sweep_without_tally() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2")], threshold("2"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);

    let admin = h.admin.clone();
    h.keeper
        .update_group_members(
            &h.ctx,
            &admin,
            h.group_id,
            vec![MemberRequest::new(addr("carol"), "1")],
        )
        .unwrap();

    h.advance(VOTING_PERIOD_SECS);
    let summary = h.keeper.end_block(&h.ctx).unwrap();
    assert_eq!(summary.aborted, 1);
    assert_eq!(summary.closed, 0);
    assert_eq!(summary.pruned, 0);

    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Aborted);
    assert_eq!(proposal.final_tally_result, TallyResult::zero());
    h.assert_invariants();

    // The following sweep removes the aborted proposal and its votes.
    h.advance(1);
    let summary = h.keeper.end_block(&h.ctx).unwrap();
    assert_eq!(summary.pruned, 1);
    assert!(h.keeper.proposal(id).is_err());
    assert_eq!(h.keeper.store().vote_count(), 0);
    h.assert_invariants();
}

#[test]
fn test_policy_change_aborts_open_proposals_eagerly() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2")], threshold("2"));
    let open = h.submit(&["alice"]);
    let closed = h.submit(&["bob"]);
    h.vote(closed, "bob", VoteOption::Yes);
    assert_eq!(h.keeper.proposal(closed).unwrap().status, ProposalStatus::Accepted);

    let admin = h.admin.clone();
    let policy = h.policy.clone();
    h.keeper
        .update_group_policy_decision_policy(&h.ctx, &admin, &policy, percentage("0.5"))
        .unwrap();

    assert_eq!(h.keeper.proposal(open).unwrap().status, ProposalStatus::Aborted);
    assert_eq!(h.keeper.proposal(closed).unwrap().status, ProposalStatus::Accepted);
    assert_eq!(h.keeper.group_policy_info(&policy).unwrap().version, 2);
    h.assert_invariants();
}

#[test]
fn test_tally_uses_current_member_weights() {
    let mut h = Harness::new(
        &[("alice", "1"), ("bob", "1"), ("carol", "2")],
        threshold("3"),
    );
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);
    h.vote(id, "bob", VoteOption::No);

    let tally = h.keeper.tally_result(id).unwrap();
    assert_eq!(tally.yes_count, Dec::ONE);
    assert_eq!(tally.no_count, Dec::ONE);

    h.keeper.leave_group(&h.ctx, &addr("bob"), h.group_id).unwrap();
    let group = h.keeper.group_info(h.group_id).unwrap();
    assert_eq!(group.total_weight, Dec::from_u64(3));

    let tally = h.keeper.tally_result(id).unwrap();
    assert_eq!(tally.yes_count, Dec::ONE);
    assert_eq!(tally.no_count, Dec::ZERO);

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("carol"), VoteOption::Yes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
}

#[test]
fn test_closed_tally_is_frozen() {
    let mut h = Harness::new(&[("alice", "2"), ("bob", "1")], threshold("2"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);
    let frozen = h.keeper.tally_result(id).unwrap();
    assert_eq!(frozen.yes_count, Dec::from_u64(2));

    h.keeper.leave_group(&h.ctx, &addr("alice"), h.group_id).unwrap();
    assert_eq!(h.keeper.tally_result(id).unwrap(), frozen);
    assert_eq!(
        h.keeper.proposal(id).unwrap().final_tally_result,
        frozen
    );
}

#[test]
fn test_failed_actions_leave_no_effects() {
    let mut h = Harness::new(&[("alice", "1")], threshold("1"));
    let req = SubmitProposalRequest::new(h.policy.clone(), vec![addr("alice")])
        .with_action(send(&h.policy, "bob", 60))
        .with_action(send(&h.policy, "carol", 60));
    let id = h.submit_with(req);
    h.vote(id, "alice", VoteOption::Yes);

    let res = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Failure);
    assert!(res.logs.contains("action 1 failed"));
    assert_eq!(h.keeper.router().balance("bob"), 0);
    assert_eq!(h.keeper.router().balance(h.policy.as_str()), 100);

    // A failed execution may be retried.
    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Accepted);
    assert_eq!(proposal.executor_result, ProposalExecutorResult::Failure);
    let res = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Failure);
}

#[test]
fn test_failed_exec_succeeds_after_router_is_fixed() {
    let mut h = Harness::new(&[("alice", "1")], threshold("1"));
    let req = SubmitProposalRequest::new(h.policy.clone(), vec![addr("alice")])
        .with_action(send(&h.policy, "bob", 60))
        .with_action(send(&h.policy, "carol", 60));
    let id = h.submit_with(req);
    h.vote(id, "alice", VoteOption::Yes);

    let res = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Failure);

    h.keeper.router_mut().balances.insert(h.policy.clone(), 150);

    let res = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Success);
    assert!(res.logs.is_empty());
    assert_eq!(h.keeper.router().balance("bob"), 60);
    assert_eq!(h.keeper.router().balance("carol"), 60);
    assert_eq!(h.keeper.router().balance(h.policy.as_str()), 30);
    assert!(h.keeper.proposal(id).is_err());
    h.assert_invariants();
}

#[test]
fn test_threshold_above_total_weight_never_passes() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "2")], threshold("10"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);
    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Rejected);
    assert_eq!(proposal.final_tally_result.yes_count, Dec::ONE);
}

#[test]
fn test_percentage_policy() {
    let mut h = Harness::new(
        &[("alice", "1"), ("bob", "1"), ("carol", "2")],
        percentage("0.5"),
    );
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Submitted);
    h.vote(id, "bob", VoteOption::Yes);
    assert_eq!(h.keeper.proposal(id).unwrap().status, ProposalStatus::Accepted);
}

#[test]
fn test_submit_with_try_exec_runs_immediately() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "1")], threshold("2"));
    let req = SubmitProposalRequest::new(h.policy.clone(), vec![addr("alice"), addr("bob")])
        .with_action(send(&h.policy, "dave", 10))
        .with_exec(Exec::Try);
    let id = h.submit_with(req);

    assert!(h.keeper.proposal(id).is_err());
    assert_eq!(h.keeper.router().balance("dave"), 10);
    let events = h.keeper.take_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GroupEvent::Exec { result: ProposalExecutorResult::Success, .. }
    )));
}

#[test]
fn test_min_execution_period_defers_execution() {
    let policy = group_types::DecisionPolicy::threshold(
        "1",
        windows().with_min_execution_period(std::time::Duration::from_secs(90)),
    )
    .unwrap();
    let mut h = Harness::new(&[("alice", "1")], policy);
    let req = SubmitProposalRequest::new(h.policy.clone(), vec![addr("alice")])
        .with_action(send(&h.policy, "alice", 5))
        .with_exec(Exec::Try);
    let id = h.submit_with(req);

    let proposal = h.keeper.proposal(id).unwrap();
    assert_eq!(proposal.status, ProposalStatus::Accepted);
    assert_eq!(proposal.executor_result, ProposalExecutorResult::NotRun);

    h.advance(30);
    let err = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap_err();
    assert!(matches!(err, GroupError::NotExecutableYet { .. }));
    assert_eq!(err.kind(), ErrorKind::State);

    h.advance(60);
    let res = h.keeper.exec(&h.ctx, id, &addr("alice")).unwrap();
    assert_eq!(res.result, ProposalExecutorResult::Success);
    assert_eq!(h.keeper.router().balance("alice"), 5);
}

#[test]
fn test_unexecuted_proposals_are_pruned_after_execution_window() {
    let mut h = Harness::new(&[("alice", "1")], threshold("1"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Yes);

    let window = h.keeper.config().max_execution_period_secs;
    h.advance(VOTING_PERIOD_SECS + window);
    h.keeper.end_block(&h.ctx).unwrap();
    assert!(h.keeper.proposal(id).is_ok());

    h.advance(1);
    let summary = h.keeper.end_block(&h.ctx).unwrap();
    assert_eq!(summary.pruned, 1);
    assert!(matches!(
        h.keeper.exec(&h.ctx, id, &addr("alice")),
        Err(GroupError::NotFound(_))
    ));
}

#[test]
fn test_vote_rules() {
    let mut h = Harness::new(&[("alice", "1"), ("bob", "5")], threshold("5"));
    let id = h.submit(&["alice"]);
    h.vote(id, "alice", VoteOption::Abstain);

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("alice"), VoteOption::Yes))
        .unwrap_err();
    assert!(matches!(err, GroupError::AlreadyVoted { .. }));

    let err = h
        .keeper
        .vote(&h.ctx, VoteRequest::new(id, addr("mallory"), VoteOption::Yes))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let vote = h.keeper.vote_by_proposal_voter(id, &addr("alice")).unwrap();
    assert_eq!(vote.option, VoteOption::Abstain);
}

#[test]
fn test_submit_validation() {
    let mut h = Harness::new(&[("alice", "1")], threshold("1"));
    let policy = h.policy.clone();

    let cases = vec![
        (SubmitProposalRequest::new(policy.clone(), vec![]), ErrorKind::Validation),
        (
            SubmitProposalRequest::new(policy.clone(), vec![addr("alice"), addr("alice")]),
            ErrorKind::Validation,
        ),
        (
            SubmitProposalRequest::new(policy.clone(), vec![addr("mallory")]),
            ErrorKind::Authorization,
        ),
        (
            SubmitProposalRequest::new(policy.clone(), vec![addr("alice")])
                .with_action(send(&addr("mallory"), "mallory", 1)),
            ErrorKind::Authorization,
        ),
        (
            SubmitProposalRequest::new(addr("nopolicy"), vec![addr("alice")]),
            ErrorKind::NotFound,
        ),
        (
            SubmitProposalRequest::new(policy.clone(), vec![addr("alice")])
                .with_title("title", "summary")
                .with_metadata(r#"{"title":"other","summary":"summary"}"#),
            ErrorKind::Validation,
        ),
    ];

    for (req, kind) in cases {
        let err = h.keeper.submit_proposal(&h.ctx, req).unwrap_err();
        assert_eq!(err.kind(), kind, "{err}");
    }
    assert!(h
        .keeper
        .proposals_by_group_policy(&policy, QueryWindow::all())
        .unwrap()
        .is_empty());
    // Only the harness setup emitted events.
    assert_eq!(h.keeper.take_events().len(), 2);
}
