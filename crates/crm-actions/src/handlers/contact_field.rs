use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use super::require_contact;
use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, UpdateContactFieldParams};
use crate::ports::ContactUpdater;

/// Writes one field of the contact record
pub struct UpdateContactFieldHandler {
    contacts: Arc<dyn ContactUpdater>,
}

impl UpdateContactFieldHandler {
    pub fn new(contacts: Arc<dyn ContactUpdater>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl ActionHandler for UpdateContactFieldHandler {
    fn action_type(&self) -> ActionType {
        ActionType::UpdateContactField
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::UpdateContactField)?;
        let params: UpdateContactFieldParams = params::parse(action)?;
        let contact_id = require_contact(ctx, ActionType::UpdateContactField)?;

        debug!(contact_id = %contact_id, field = %params.field, "Updating contact field");
        self.contacts
            .update_field(&ctx.tenant_id, contact_id, &params.field, params.value)
            .await
    }
}
