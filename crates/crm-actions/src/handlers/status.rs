use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use super::require_contact;
use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, ChangeStatusParams};
use crate::ports::StatusChanger;

/// Moves the contact to another status
pub struct ChangeStatusHandler {
    changer: Arc<dyn StatusChanger>,
}

impl ChangeStatusHandler {
    pub fn new(changer: Arc<dyn StatusChanger>) -> Self {
        Self { changer }
    }
}

#[async_trait]
impl ActionHandler for ChangeStatusHandler {
    fn action_type(&self) -> ActionType {
        ActionType::ChangeStatus
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::ChangeStatus)?;
        let params: ChangeStatusParams = params::parse(action)?;
        let contact_id = require_contact(ctx, ActionType::ChangeStatus)?;

        debug!(contact_id = %contact_id, status = %params.status, "Changing contact status");
        self.changer
            .change_status(&ctx.tenant_id, contact_id, &params.status)
            .await
    }
}
