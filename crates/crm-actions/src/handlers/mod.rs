//! Built-in action handlers
//!
//! Each handler parses its typed params, resolves the targets it needs from
//! the action context and makes one call to its collaborator port.

mod assign;
mod contact_field;
mod message;
mod status;
mod tags;
mod webhook;
mod workflow;

pub use assign::AssignAgentHandler;
pub use contact_field::UpdateContactFieldHandler;
pub use message::SendMessageHandler;
pub use status::ChangeStatusHandler;
pub use tags::{AddTagHandler, RemoveTagHandler};
pub use webhook::SendWebhookHandler;
pub use workflow::TriggerWorkflowHandler;

use crm_automation::{ActionContext, ActionType};
use uuid::Uuid;

use crate::error::{ActionError, ActionResult};

/// Contact the action applies to
fn require_contact(ctx: &ActionContext, action_type: ActionType) -> ActionResult<Uuid> {
    ctx.contact_id.ok_or(ActionError::MissingTarget {
        action_type,
        target: "contact_id",
    })
}

#[cfg(test)]
pub(crate) mod mocks {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;
    use uuid::Uuid;

    use crate::error::{ActionError, ActionResult};
    use crate::ports::*;

    #[derive(Default)]
    pub struct RecordingMessages {
        pub sent: Mutex<Vec<OutgoingMessage>>,
    }

    #[async_trait]
    impl MessageSender for RecordingMessages {
        async fn send_message(&self, message: OutgoingMessage) -> ActionResult<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingStatuses {
        pub changes: Mutex<Vec<(Uuid, String)>>,
    }

    #[async_trait]
    impl StatusChanger for RecordingStatuses {
        async fn change_status(
            &self,
            _tenant_id: &str,
            contact_id: Uuid,
            status: &str,
        ) -> ActionResult<()> {
            self.changes.lock().unwrap().push((contact_id, status.to_string()));
            Ok(())
        }
    }

    /// Keeps a tag set per contact
    #[derive(Default)]
    pub struct RecordingTags {
        pub tags: Mutex<HashMap<Uuid, Vec<String>>>,
    }

    #[async_trait]
    impl TagManager for RecordingTags {
        async fn add_tag(&self, _tenant_id: &str, contact_id: Uuid, tag: &str) -> ActionResult<()> {
            let mut tags = self.tags.lock().unwrap();
            let entry = tags.entry(contact_id).or_default();
            if !entry.iter().any(|t| t == tag) {
                entry.push(tag.to_string());
            }
            Ok(())
        }

        async fn remove_tag(
            &self,
            _tenant_id: &str,
            contact_id: Uuid,
            tag: &str,
        ) -> ActionResult<()> {
            if let Some(entry) = self.tags.lock().unwrap().get_mut(&contact_id) {
                entry.retain(|t| t != tag);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingWebhooks {
        pub requests: Mutex<Vec<WebhookRequest>>,
    }

    #[async_trait]
    impl WebhookSender for RecordingWebhooks {
        async fn send(&self, request: WebhookRequest) -> ActionResult<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingWorkflows {
        pub requests: Mutex<Vec<WorkflowRequest>>,
    }

    #[async_trait]
    impl WorkflowTrigger for RecordingWorkflows {
        async fn trigger(&self, request: WorkflowRequest) -> ActionResult<()> {
            self.requests.lock().unwrap().push(request);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingAgents {
        pub assignments: Mutex<Vec<(Uuid, Option<Uuid>, Uuid)>>,
    }

    #[async_trait]
    impl AgentAssigner for RecordingAgents {
        async fn assign_agent(
            &self,
            _tenant_id: &str,
            contact_id: Uuid,
            session_id: Option<Uuid>,
            agent_id: Uuid,
        ) -> ActionResult<()> {
            self.assignments
                .lock()
                .unwrap()
                .push((contact_id, session_id, agent_id));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingContacts {
        pub updates: Mutex<Vec<(Uuid, String, Value)>>,
    }

    #[async_trait]
    impl ContactUpdater for RecordingContacts {
        async fn update_field(
            &self,
            _tenant_id: &str,
            contact_id: Uuid,
            field: &str,
            value: Value,
        ) -> ActionResult<()> {
            self.updates
                .lock()
                .unwrap()
                .push((contact_id, field.to_string(), value));
            Ok(())
        }
    }

    /// A status changer whose backend is down
    pub struct UnavailableStatuses;

    #[async_trait]
    impl StatusChanger for UnavailableStatuses {
        async fn change_status(
            &self,
            _tenant_id: &str,
            _contact_id: Uuid,
            _status: &str,
        ) -> ActionResult<()> {
            Err(ActionError::collaborator("status changer", "connection refused"))
        }
    }
}
