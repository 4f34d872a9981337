use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, TriggerWorkflowParams};
use crate::ports::{WorkflowRequest, WorkflowTrigger};

/// Starts an external workflow
pub struct TriggerWorkflowHandler {
    workflows: Arc<dyn WorkflowTrigger>,
}

impl TriggerWorkflowHandler {
    pub fn new(workflows: Arc<dyn WorkflowTrigger>) -> Self {
        Self { workflows }
    }
}

#[async_trait]
impl ActionHandler for TriggerWorkflowHandler {
    fn action_type(&self) -> ActionType {
        ActionType::TriggerWorkflow
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::TriggerWorkflow)?;
        let params: TriggerWorkflowParams = params::parse(action)?;

        debug!(workflow_id = %params.workflow_id, "Triggering workflow");
        self.workflows
            .trigger(WorkflowRequest {
                workflow_id: params.workflow_id,
                tenant_id: ctx.tenant_id.clone(),
                rule_id: ctx.rule_id,
                contact_id: ctx.contact_id,
                session_id: ctx.session_id,
                input: params.input,
            })
            .await
    }
}
