use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, WebhookParams};
use crate::ports::{WebhookRequest, WebhookSender};

/// Calls an external endpoint
///
/// Without an explicit `payload` param the request body is the action
/// context itself.
pub struct SendWebhookHandler {
    sender: Arc<dyn WebhookSender>,
}

impl SendWebhookHandler {
    pub fn new(sender: Arc<dyn WebhookSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ActionHandler for SendWebhookHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SendWebhook
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::SendWebhook)?;
        let params: WebhookParams = params::parse(action)?;

        let body = match params.payload {
            Some(payload) => payload,
            None => serde_json::to_value(ctx)?,
        };

        debug!(url = %params.url, method = params.method.as_str(), "Sending webhook");
        self.sender
            .send(WebhookRequest {
                url: params.url,
                method: params.method,
                headers: params.headers,
                body,
            })
            .await
    }
}
