//! The host seam for executing proposal actions.

use group_types::{Action, ActionResponse, Address};
use thiserror::Error;

/// Errors a host may return for a single action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no handler for route {0}")]
    UnknownRoute(String),

    #[error("{0}")]
    Rejected(String),
}

/// Executes actions on behalf of a group policy account.
///
/// Routers are cloned to create a branch for each proposal execution. A
/// branch is swapped back only when every action of the proposal
/// succeeded, so a router's state must live entirely inside the value.
pub trait ActionRouter: Clone {
    fn run_action(
        &mut self,
        action: &Action,
        policy_address: &Address,
    ) -> Result<ActionResponse, ActionError>;
}
