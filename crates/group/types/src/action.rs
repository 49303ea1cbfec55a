//! Proposal actions
//!
//! An action is an opaque request routed to the host, executed with the
//! group policy account as its sole authorized signer.

use crate::{Address, GroupError, GroupResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Host route, e.g. `"bank/send"`.
    pub route: String,
    /// Addresses whose authority the action requires.
    pub signers: Vec<Address>,
    pub payload: serde_json::Value,
}

impl Action {
    pub fn new(route: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            route: route.into(),
            signers: Vec::new(),
            payload,
        }
    }

    pub fn with_signer(mut self, signer: Address) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn validate_basic(&self) -> GroupResult<()> {
        if self.route.trim().is_empty() {
            return Err(GroupError::Empty("action route"));
        }
        if self.signers.is_empty() {
            return Err(GroupError::Empty("action signers"));
        }
        Ok(())
    }

    /// Distinct signers in address order.
    pub fn unique_signers(&self) -> BTreeSet<&Address> {
        self.signers.iter().collect()
    }
}

/// Response returned by the host for one executed action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub route: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Require every action to be signed by exactly `policy_address` and no one
/// else.
pub fn ensure_actions_authz(actions: &[Action], policy_address: &Address) -> GroupResult<()> {
    for (index, action) in actions.iter().enumerate() {
        let signers = action.unique_signers();
        if signers.len() != 1 || !signers.contains(policy_address) {
            return Err(GroupError::Unauthorized(format!(
                "action {index} ({}) must be signed only by group policy {policy_address}",
                action.route
            )));
        }
    }
    Ok(())
}
