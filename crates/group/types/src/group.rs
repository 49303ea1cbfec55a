//! Group and group policy records

use crate::{Address, DecisionPolicy, GroupId};
use chrono::{DateTime, Utc};
use group_math::Dec;
use serde::{Deserialize, Serialize};

/// A group: an admin, a member set and the sum of member weights.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,
    pub admin: Address,
    pub metadata: String,
    /// Bumped on every membership, admin or metadata change.
    pub version: u64,
    /// Sum of all current member weights.
    pub total_weight: Dec,
    pub created_at: DateTime<Utc>,
}

/// A policy account owned by a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPolicyInfo {
    pub address: Address,
    pub group_id: GroupId,
    pub admin: Address,
    pub metadata: String,
    /// Starts at 1, bumped on every admin, decision policy or metadata change.
    pub version: u64,
    pub decision_policy: DecisionPolicy,
    pub created_at: DateTime<Utc>,
}
