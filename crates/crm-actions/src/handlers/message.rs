use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use crate::error::{ActionError, ActionResult};
use crate::executor::ActionHandler;
use crate::params::{self, SendMessageParams};
use crate::ports::{MessageSender, OutgoingMessage};

/// Sends a message into the session, or to the contact when there is none
pub struct SendMessageHandler {
    sender: Arc<dyn MessageSender>,
}

impl SendMessageHandler {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ActionHandler for SendMessageHandler {
    fn action_type(&self) -> ActionType {
        ActionType::SendMessage
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::SendMessage)?;
        let params: SendMessageParams = params::parse(action)?;

        if ctx.session_id.is_none() && ctx.contact_id.is_none() {
            return Err(ActionError::MissingTarget {
                action_type: ActionType::SendMessage,
                target: "session_id or contact_id",
            });
        }

        let message = OutgoingMessage {
            tenant_id: ctx.tenant_id.clone(),
            session_id: ctx.session_id,
            contact_id: ctx.contact_id,
            channel_id: params.channel_id.or(ctx.channel_id),
            content: params.content,
        };

        debug!(
            session_id = ?message.session_id,
            contact_id = ?message.contact_id,
            "Sending message"
        );
        self.sender.send_message(message).await
    }
}
