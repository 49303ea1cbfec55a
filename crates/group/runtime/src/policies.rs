//! Group policy accounts

use crate::context::BlockContext;
use crate::keeper::{load_group, load_policy, GroupKeeper, Txn};
use crate::msgs::CreateGroupPolicyRequest;
use crate::router::ActionRouter;
use crate::validation::assert_metadata_length;
use group_store::{GroupStore, QueryWindow};
use group_types::{
    Address, DecisionPolicy, GroupError, GroupEvent, GroupPolicyInfo, GroupResult,
    ProposalStatus,
};
use tracing::info;

const POLICY_ADDRESS_PREFIX: &str = "grouppolicy";

/// Derive the account address for the `seq`-th group policy.
pub fn derive_policy_address(seq: u64) -> GroupResult<Address> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"group/policy");
    hasher.update(&seq.to_be_bytes());
    let hash = hasher.finalize();
    let hex = hash.to_hex();
    Address::new(format!("{POLICY_ADDRESS_PREFIX}1{}", &hex.as_str()[..40]))
}

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    /// Create a policy account for a group. Returns the new account address.
    pub fn create_group_policy(
        &mut self,
        ctx: &BlockContext,
        req: CreateGroupPolicyRequest,
    ) -> GroupResult<Address> {
        self.transact(ctx, "create_group_policy", |tx| tx.create_group_policy(req))
    }

    pub fn update_group_policy_admin(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        address: &Address,
        new_admin: Address,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_policy_admin", |tx| {
            tx.update_group_policy_admin(admin, address, new_admin)
        })
    }

    pub fn update_group_policy_decision_policy(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        address: &Address,
        decision_policy: DecisionPolicy,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_policy_decision_policy", |tx| {
            tx.update_group_policy_decision_policy(admin, address, decision_policy)
        })
    }

    pub fn update_group_policy_metadata(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        address: &Address,
        metadata: String,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_policy_metadata", |tx| {
            tx.update_group_policy_metadata(admin, address, metadata)
        })
    }
}

impl<S, R> Txn<'_, S, R>
where
    S: GroupStore,
    R: ActionRouter,
{
    pub(crate) fn create_group_policy(
        &mut self,
        req: CreateGroupPolicyRequest,
    ) -> GroupResult<Address> {
        assert_metadata_length(self.config, &req.metadata, "group policy metadata")?;
        req.decision_policy.validate_basic()?;

        let group = load_group(&self.store, req.group_id)?;
        if group.admin != req.admin {
            return Err(GroupError::Unauthorized(format!(
                "not group admin; got {}, expected {}",
                req.admin, group.admin
            )));
        }
        req.decision_policy.validate(&group, self.config)?;

        let address = loop {
            let seq = self.store.next_policy_seq()?;
            let candidate = derive_policy_address(seq)?;
            if self.store.get_policy(&candidate)?.is_none() {
                break candidate;
            }
        };

        self.store.create_policy(GroupPolicyInfo {
            address: address.clone(),
            group_id: group.id,
            admin: req.admin.clone(),
            metadata: req.metadata,
            version: 1,
            decision_policy: req.decision_policy,
            created_at: self.now(),
        })?;

        info!(
            address = %address,
            group_id = %group.id,
            admin = %req.admin,
            "Group policy created"
        );
        self.emit(GroupEvent::CreateGroupPolicy {
            address: address.clone(),
        });
        Ok(address)
    }

    pub(crate) fn update_group_policy_admin(
        &mut self,
        admin: &Address,
        address: &Address,
        new_admin: Address,
    ) -> GroupResult<()> {
        if admin == &new_admin {
            return Err(GroupError::Invalid("new and old admin are the same".into()));
        }
        let mut policy = self.load_policy_as_admin(address, admin)?;
        policy.admin = new_admin;
        self.commit_policy_update(policy)
    }

    pub(crate) fn update_group_policy_decision_policy(
        &mut self,
        admin: &Address,
        address: &Address,
        decision_policy: DecisionPolicy,
    ) -> GroupResult<()> {
        decision_policy.validate_basic()?;
        let mut policy = self.load_policy_as_admin(address, admin)?;
        let group = load_group(&self.store, policy.group_id)?;
        decision_policy.validate(&group, self.config)?;
        policy.decision_policy = decision_policy;
        self.commit_policy_update(policy)
    }

    pub(crate) fn update_group_policy_metadata(
        &mut self,
        admin: &Address,
        address: &Address,
        metadata: String,
    ) -> GroupResult<()> {
        assert_metadata_length(self.config, &metadata, "group policy metadata")?;
        let mut policy = self.load_policy_as_admin(address, admin)?;
        policy.metadata = metadata;
        self.commit_policy_update(policy)
    }

    fn load_policy_as_admin(
        &self,
        address: &Address,
        admin: &Address,
    ) -> GroupResult<GroupPolicyInfo> {
        let policy = load_policy(&self.store, address)?;
        if &policy.admin != admin {
            return Err(GroupError::Unauthorized(format!(
                "not group policy admin; got {admin}, expected {}",
                policy.admin
            )));
        }
        Ok(policy)
    }

    /// Bump the version, persist, and abort every proposal still open under
    /// the policy.
    fn commit_policy_update(&mut self, mut policy: GroupPolicyInfo) -> GroupResult<()> {
        policy.version += 1;
        let address = policy.address.clone();
        info!(address = %address, version = policy.version, "Group policy updated");
        self.store.update_policy(policy)?;
        self.abort_proposals(&address)?;
        self.emit(GroupEvent::UpdateGroupPolicy { address });
        Ok(())
    }

    fn abort_proposals(&mut self, address: &Address) -> GroupResult<()> {
        let mut aborted = 0usize;
        for mut proposal in self.store.proposals_by_policy(address, QueryWindow::all())? {
            if proposal.status == ProposalStatus::Submitted {
                proposal.status = ProposalStatus::Aborted;
                self.store.update_proposal(proposal)?;
                aborted += 1;
            }
        }
        if aborted > 0 {
            info!(address = %address, aborted, "Open proposals aborted after policy change");
        }
        Ok(())
    }
}
