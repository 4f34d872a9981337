use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use super::require_contact;
use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, AssignAgentParams};
use crate::ports::AgentAssigner;

/// Assigns an agent to the contact (and its session, if any)
pub struct AssignAgentHandler {
    assigner: Arc<dyn AgentAssigner>,
}

impl AssignAgentHandler {
    pub fn new(assigner: Arc<dyn AgentAssigner>) -> Self {
        Self { assigner }
    }
}

#[async_trait]
impl ActionHandler for AssignAgentHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AssignAgent
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::AssignAgent)?;
        let params: AssignAgentParams = params::parse(action)?;
        let contact_id = require_contact(ctx, ActionType::AssignAgent)?;

        debug!(contact_id = %contact_id, agent_id = %params.agent_id, "Assigning agent");
        self.assigner
            .assign_agent(&ctx.tenant_id, contact_id, ctx.session_id, params.agent_id)
            .await
    }
}
