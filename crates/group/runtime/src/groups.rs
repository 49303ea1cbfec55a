//! Group administration

use crate::context::BlockContext;
use crate::keeper::{load_group, GroupKeeper, Txn};
use crate::msgs::{
    CreateGroupPolicyRequest, CreateGroupRequest, CreateGroupWithPolicyRequest,
    CreateGroupWithPolicyResponse,
};
use crate::router::ActionRouter;
use crate::validation::assert_metadata_length;
use group_store::{GroupStore, QueryWindow};
use group_types::{
    validate_member_requests, Address, Dec, GroupError, GroupEvent, GroupId, GroupInfo,
    GroupMember, GroupResult, Member, MemberRequest,
};
use tracing::{debug, info};

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    pub fn create_group(
        &mut self,
        ctx: &BlockContext,
        req: CreateGroupRequest,
    ) -> GroupResult<GroupId> {
        self.transact(ctx, "create_group", |tx| tx.create_group(req))
    }

    /// Apply member additions, weight changes and removals (weight `"0"`).
    pub fn update_group_members(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        group_id: GroupId,
        updates: Vec<MemberRequest>,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_members", |tx| {
            tx.update_group_members(admin, group_id, updates)
        })
    }

    pub fn update_group_admin(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        group_id: GroupId,
        new_admin: Address,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_admin", |tx| {
            tx.update_group_admin(admin, group_id, new_admin)
        })
    }

    pub fn update_group_metadata(
        &mut self,
        ctx: &BlockContext,
        admin: &Address,
        group_id: GroupId,
        metadata: String,
    ) -> GroupResult<()> {
        self.transact(ctx, "update_group_metadata", |tx| {
            tx.update_group_metadata(admin, group_id, metadata)
        })
    }

    /// Remove `address` from the group on its own request.
    pub fn leave_group(
        &mut self,
        ctx: &BlockContext,
        address: &Address,
        group_id: GroupId,
    ) -> GroupResult<()> {
        self.transact(ctx, "leave_group", |tx| tx.leave_group(address, group_id))
    }

    pub fn create_group_with_policy(
        &mut self,
        ctx: &BlockContext,
        req: CreateGroupWithPolicyRequest,
    ) -> GroupResult<CreateGroupWithPolicyResponse> {
        self.transact(ctx, "create_group_with_policy", |tx| {
            tx.create_group_with_policy(req)
        })
    }
}

impl<S, R> Txn<'_, S, R>
where
    S: GroupStore,
    R: ActionRouter,
{
    pub(crate) fn create_group(&mut self, req: CreateGroupRequest) -> GroupResult<GroupId> {
        assert_metadata_length(self.config, &req.metadata, "group metadata")?;
        validate_member_requests(&req.members)?;

        let mut total_weight = Dec::ZERO;
        let mut members = Vec::with_capacity(req.members.len());
        for request in &req.members {
            assert_metadata_length(self.config, &request.metadata, "member metadata")?;
            let weight = Dec::parse_positive(&request.weight)?;
            total_weight = total_weight.checked_add(weight)?;
            members.push(Member {
                address: request.address.clone(),
                weight,
                metadata: request.metadata.clone(),
                added_at: self.now(),
            });
        }

        let group_id = self.store.next_group_id()?;
        self.store.create_group(GroupInfo {
            id: group_id,
            admin: req.admin.clone(),
            metadata: req.metadata,
            version: 1,
            total_weight,
            created_at: self.now(),
        })?;
        for member in members {
            self.store.create_member(GroupMember { group_id, member })?;
        }

        info!(
            group_id = %group_id,
            admin = %req.admin,
            members = req.members.len(),
            total_weight = %total_weight,
            "Group created"
        );
        self.emit(GroupEvent::CreateGroup { group_id });
        Ok(group_id)
    }

    pub(crate) fn update_group_members(
        &mut self,
        admin: &Address,
        group_id: GroupId,
        updates: Vec<MemberRequest>,
    ) -> GroupResult<()> {
        if updates.is_empty() {
            return Err(GroupError::Empty("member updates"));
        }
        validate_member_requests(&updates)?;
        for update in &updates {
            assert_metadata_length(self.config, &update.metadata, "member metadata")?;
        }

        let mut group = self.load_group_as_admin(group_id, admin)?;

        for update in updates {
            let weight = update.parsed_weight()?;
            let existing = self.store.get_member(group_id, &update.address)?;

            if weight.is_zero() {
                let existing = existing.ok_or_else(|| {
                    GroupError::NotFound(format!(
                        "member {} of group {group_id}",
                        update.address
                    ))
                })?;
                group.total_weight = group.total_weight.sub_non_negative(existing.weight())?;
                self.store.delete_member(group_id, &update.address)?;
                debug!(group_id = %group_id, member = %update.address, "Member removed");
                continue;
            }

            match existing {
                Some(mut current) => {
                    group.total_weight = group
                        .total_weight
                        .sub_non_negative(current.weight())?
                        .checked_add(weight)?;
                    current.member.weight = weight;
                    current.member.metadata = update.metadata;
                    self.store.update_member(current)?;
                }
                None => {
                    group.total_weight = group.total_weight.checked_add(weight)?;
                    self.store.create_member(GroupMember {
                        group_id,
                        member: Member {
                            address: update.address.clone(),
                            weight,
                            metadata: update.metadata,
                            added_at: self.now(),
                        },
                    })?;
                }
            }
            debug!(group_id = %group_id, member = %update.address, weight = %weight, "Member set");
        }

        self.commit_group_update(group)
    }

    pub(crate) fn update_group_admin(
        &mut self,
        admin: &Address,
        group_id: GroupId,
        new_admin: Address,
    ) -> GroupResult<()> {
        if admin == &new_admin {
            return Err(GroupError::Invalid("new and old admin are the same".into()));
        }
        let mut group = self.load_group_as_admin(group_id, admin)?;
        group.admin = new_admin;
        self.commit_group_update(group)
    }

    pub(crate) fn update_group_metadata(
        &mut self,
        admin: &Address,
        group_id: GroupId,
        metadata: String,
    ) -> GroupResult<()> {
        assert_metadata_length(self.config, &metadata, "group metadata")?;
        let mut group = self.load_group_as_admin(group_id, admin)?;
        group.metadata = metadata;
        self.commit_group_update(group)
    }

    pub(crate) fn leave_group(&mut self, address: &Address, group_id: GroupId) -> GroupResult<()> {
        let mut group = load_group(&self.store, group_id)?;
        let member = self.store.get_member(group_id, address)?.ok_or_else(|| {
            GroupError::NotFound(format!("member {address} of group {group_id}"))
        })?;

        group.total_weight = group.total_weight.sub_non_negative(member.weight())?;
        self.store.delete_member(group_id, address)?;

        group.version += 1;
        self.validate_decision_policies(&group)?;
        self.store.update_group(group)?;

        info!(group_id = %group_id, member = %address, "Member left group");
        self.emit(GroupEvent::LeaveGroup {
            group_id,
            address: address.clone(),
        });
        Ok(())
    }

    pub(crate) fn create_group_with_policy(
        &mut self,
        req: CreateGroupWithPolicyRequest,
    ) -> GroupResult<CreateGroupWithPolicyResponse> {
        let group_id = self.create_group(CreateGroupRequest {
            admin: req.admin.clone(),
            members: req.members,
            metadata: req.group_metadata,
        })?;

        let address = self.create_group_policy(CreateGroupPolicyRequest {
            admin: req.admin.clone(),
            group_id,
            metadata: req.group_policy_metadata,
            decision_policy: req.decision_policy,
        })?;

        if req.group_policy_as_admin {
            self.update_group_admin(&req.admin, group_id, address.clone())?;
            self.update_group_policy_admin(&req.admin, &address, address.clone())?;
        }

        Ok(CreateGroupWithPolicyResponse {
            group_id,
            group_policy_address: address,
        })
    }

    fn load_group_as_admin(&self, group_id: GroupId, admin: &Address) -> GroupResult<GroupInfo> {
        let group = load_group(&self.store, group_id)?;
        if &group.admin != admin {
            return Err(GroupError::Unauthorized(format!(
                "not group admin; got {admin}, expected {}",
                group.admin
            )));
        }
        Ok(group)
    }

    /// Bump the version, re-check the group's policies and persist.
    fn commit_group_update(&mut self, mut group: GroupInfo) -> GroupResult<()> {
        group.version += 1;
        self.validate_decision_policies(&group)?;

        let group_id = group.id;
        info!(
            group_id = %group_id,
            version = group.version,
            total_weight = %group.total_weight,
            "Group updated"
        );
        self.store.update_group(group)?;
        self.emit(GroupEvent::UpdateGroup { group_id });
        Ok(())
    }

    /// Every policy of the group must remain valid against the updated group.
    fn validate_decision_policies(&self, group: &GroupInfo) -> GroupResult<()> {
        for policy in self.store.policies_by_group(group.id, QueryWindow::all())? {
            policy.decision_policy.validate(group, self.config)?;
        }
        Ok(())
    }
}
