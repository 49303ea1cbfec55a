//! Atomic execution of proposal actions

use crate::router::ActionRouter;
use group_types::{
    ensure_actions_authz, Action, ActionResponse, Address, GroupError, GroupResult,
};
use tracing::{debug, warn};

/// Runs a proposal's actions in order against a branch of the router.
///
/// Either every action takes effect or none does: the first failing action
/// discards the branch and its index is reported.
pub struct Executor<'r, R> {
    router: &'r mut R,
}

impl<'r, R: ActionRouter> Executor<'r, R> {
    pub fn new(router: &'r mut R) -> Self {
        Self { router }
    }

    pub fn execute(
        &mut self,
        actions: &[Action],
        policy_address: &Address,
    ) -> GroupResult<Vec<ActionResponse>> {
        // Re-checked here since the policy may have been reconfigured after
        // submission.
        ensure_actions_authz(actions, policy_address)?;

        let mut branch = self.router.clone();
        let mut responses = Vec::with_capacity(actions.len());

        for (index, action) in actions.iter().enumerate() {
            match branch.run_action(action, policy_address) {
                Ok(response) => {
                    debug!(index, route = %action.route, "Action executed");
                    responses.push(response);
                }
                Err(e) => {
                    warn!(
                        index,
                        route = %action.route,
                        policy = %policy_address,
                        error = %e,
                        "Action failed, discarding execution branch"
                    );
                    return Err(GroupError::ActionFailed {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        *self.router = branch;
        Ok(responses)
    }
}
