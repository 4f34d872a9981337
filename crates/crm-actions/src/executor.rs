//! Execution contracts
//!
//! [`ActionExecutor`] is what the engine calls. [`ActionHandler`] is the
//! per-type unit a registry dispatches to.

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};

use crate::error::ActionResult;

/// Executes any rule action
///
/// Cancellation and deadlines belong to the caller: dropping the returned
/// future abandons the call.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()>;
}

/// Executes actions of one type
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action type this handler serves
    fn action_type(&self) -> ActionType;

    /// Validate the action's params and perform its effect
    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()>;
}
