//! Group membership records

use crate::{Address, GroupError, GroupId, GroupResult};
use chrono::{DateTime, Utc};
use group_math::Dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A member entry as supplied when creating or updating a group.
///
/// The weight is a decimal string. In an update, weight `"0"` removes the
/// member.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub address: Address,
    pub weight: String,
    #[serde(default)]
    pub metadata: String,
}

impl MemberRequest {
    pub fn new(address: Address, weight: impl Into<String>) -> Self {
        Self {
            address,
            weight: weight.into(),
            metadata: String::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    /// Parse the weight, requiring it to be non-negative.
    pub fn parsed_weight(&self) -> GroupResult<Dec> {
        Ok(Dec::parse_non_negative(&self.weight)?)
    }
}

/// Check that a batch of member requests has well-formed weights and no
/// repeated address.
pub fn validate_member_requests(members: &[MemberRequest]) -> GroupResult<()> {
    let mut seen = BTreeSet::new();
    for member in members {
        if !seen.insert(&member.address) {
            return Err(GroupError::Duplicate(format!("member address {}", member.address)));
        }
        member.parsed_weight()?;
    }
    Ok(())
}

/// A member as stored. Weights of stored members are always positive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub weight: Dec,
    pub metadata: String,
    pub added_at: DateTime<Utc>,
}

/// A member bound to its group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub member: Member,
}

impl GroupMember {
    pub fn address(&self) -> &Address {
        &self.member.address
    }

    pub fn weight(&self) -> Dec {
        self.member.weight
    }
}
