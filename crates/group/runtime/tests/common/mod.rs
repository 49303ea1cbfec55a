#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use group_runtime::{
    derive_policy_address, ActionError, ActionRouter, BlockContext, CreateGroupPolicyRequest,
    CreateGroupRequest, GroupKeeper, SubmitProposalRequest, VoteRequest,
};
use group_store::InMemoryGroupStore;
use group_types::{
    Action, ActionResponse, Address, DecisionPolicy, DecisionPolicyWindows, GroupConfig,
    GroupId, MemberRequest, ProposalId, VoteOption,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const VOTING_PERIOD_SECS: u64 = 60;

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Moves whole units between accounts. The policy account is debited.
#[derive(Clone, Debug, Default)]
pub struct BankRouter {
    pub balances: BTreeMap<Address, u64>,
}

impl BankRouter {
    pub fn with_balance(mut self, account: &Address, amount: u64) -> Self {
        self.balances.insert(account.clone(), amount);
        self
    }

    pub fn balance(&self, account: &str) -> u64 {
        self.balances.get(&addr(account)).copied().unwrap_or(0)
    }
}

impl ActionRouter for BankRouter {
    fn run_action(
        &mut self,
        action: &Action,
        policy_address: &Address,
    ) -> Result<ActionResponse, ActionError> {
        if action.route != "bank/send" {
            return Err(ActionError::UnknownRoute(action.route.clone()));
        }
        let to = action.payload["to"]
            .as_str()
            .and_then(|s| Address::new(s).ok())
            .ok_or_else(|| ActionError::Rejected("missing recipient".into()))?;
        let amount = action.payload["amount"]
            .as_u64()
            .ok_or_else(|| ActionError::Rejected("missing amount".into()))?;

        let from = self.balances.entry(policy_address.clone()).or_insert(0);
        if *from < amount {
            return Err(ActionError::Rejected(format!(
                "insufficient funds: {} < {amount}",
                *from
            )));
        }
        *from -= amount;
        *self.balances.entry(to).or_insert(0) += amount;

        Ok(ActionResponse {
            route: action.route.clone(),
            data: json!({ "sent": amount }),
        })
    }
}

pub fn send(policy: &Address, to: &str, amount: u64) -> Action {
    Action::new("bank/send", json!({ "to": to, "amount": amount })).with_signer(policy.clone())
}

pub fn windows() -> DecisionPolicyWindows {
    DecisionPolicyWindows::new(Duration::from_secs(VOTING_PERIOD_SECS))
}

pub fn threshold(value: &str) -> DecisionPolicy {
    DecisionPolicy::threshold(value, windows()).unwrap()
}

pub fn percentage(value: &str) -> DecisionPolicy {
    DecisionPolicy::percentage(value, windows()).unwrap()
}

pub struct Harness {
    pub keeper: GroupKeeper<InMemoryGroupStore, BankRouter>,
    pub ctx: BlockContext,
    pub admin: Address,
    pub group_id: GroupId,
    pub policy: Address,
}

impl Harness {
    /// A group of `members` (address, weight) with one policy funded with
    /// 100 units.
    pub fn new(members: &[(&str, &str)], decision_policy: DecisionPolicy) -> Self {
        init_tracing();
        let admin = addr("admin");
        // The first policy account of a fresh store has a known address.
        let funded = BankRouter::default().with_balance(&derive_policy_address(1).unwrap(), 100);
        let mut keeper = GroupKeeper::new(InMemoryGroupStore::new(), funded, GroupConfig::default());
        let ctx = BlockContext::new(1, t0());

        let group_id = keeper
            .create_group(
                &ctx,
                CreateGroupRequest {
                    admin: admin.clone(),
                    members: members
                        .iter()
                        .map(|(a, w)| MemberRequest::new(addr(a), *w))
                        .collect(),
                    metadata: String::new(),
                },
            )
            .unwrap();
        let policy = keeper
            .create_group_policy(
                &ctx,
                CreateGroupPolicyRequest {
                    admin: admin.clone(),
                    group_id,
                    metadata: String::new(),
                    decision_policy,
                },
            )
            .unwrap();
        assert_eq!(keeper.router().balance(policy.as_str()), 100);
        Self {
            keeper,
            ctx,
            admin,
            group_id,
            policy,
        }
    }

    pub fn advance(&mut self, secs: u64) {
        self.ctx = self.ctx.next_block(Duration::from_secs(secs)).unwrap();
    }

    pub fn submit(&mut self, proposers: &[&str]) -> ProposalId {
        let req = SubmitProposalRequest::new(
            self.policy.clone(),
            proposers.iter().map(|p| addr(p)).collect(),
        );
        self.keeper.submit_proposal(&self.ctx, req).unwrap()
    }

    pub fn submit_with(&mut self, req: SubmitProposalRequest) -> ProposalId {
        self.keeper.submit_proposal(&self.ctx, req).unwrap()
    }

    pub fn vote(&mut self, proposal_id: ProposalId, voter: &str, option: VoteOption) {
        self.keeper
            .vote(&self.ctx, VoteRequest::new(proposal_id, addr(voter), option))
            .unwrap()
    }

    pub fn assert_invariants(&self) {
        let violations = self.keeper.check_invariants();
        assert!(violations.is_empty(), "invariants broken: {violations:?}");
    }
}
