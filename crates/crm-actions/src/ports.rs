//! Collaborator ports
//!
//! The effects of built-in actions live outside this crate. Each handler
//! talks to one of these traits; the application wires in implementations
//! through [`Collaborators`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::ActionResult;
use crate::params::WebhookMethod;

/// A message to deliver to a contact or into a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub tenant_id: String,
    pub session_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub channel_id: Option<Uuid>,
    pub content: String,
}

/// An HTTP call to an external endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookRequest {
    pub url: String,
    pub method: WebhookMethod,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// A request to start an external workflow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowRequest {
    pub workflow_id: String,
    pub tenant_id: String,
    pub rule_id: Option<Uuid>,
    pub contact_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub input: HashMap<String, Value>,
}

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, message: OutgoingMessage) -> ActionResult<()>;
}

#[async_trait]
pub trait StatusChanger: Send + Sync {
    async fn change_status(&self, tenant_id: &str, contact_id: Uuid, status: &str)
        -> ActionResult<()>;
}

#[async_trait]
pub trait TagManager: Send + Sync {
    async fn add_tag(&self, tenant_id: &str, contact_id: Uuid, tag: &str) -> ActionResult<()>;
    async fn remove_tag(&self, tenant_id: &str, contact_id: Uuid, tag: &str) -> ActionResult<()>;
}

#[async_trait]
pub trait WebhookSender: Send + Sync {
    async fn send(&self, request: WebhookRequest) -> ActionResult<()>;
}

#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    async fn trigger(&self, request: WorkflowRequest) -> ActionResult<()>;
}

#[async_trait]
pub trait AgentAssigner: Send + Sync {
    async fn assign_agent(
        &self,
        tenant_id: &str,
        contact_id: Uuid,
        session_id: Option<Uuid>,
        agent_id: Uuid,
    ) -> ActionResult<()>;
}

#[async_trait]
pub trait ContactUpdater: Send + Sync {
    async fn update_field(
        &self,
        tenant_id: &str,
        contact_id: Uuid,
        field: &str,
        value: Value,
    ) -> ActionResult<()>;
}

/// The set of collaborators available to built-in handlers
///
/// Only action types whose collaborator is present get a handler in
/// [`ActionRegistry::register_builtin`](crate::ActionRegistry::register_builtin).
#[derive(Clone, Default)]
pub struct Collaborators {
    pub messages: Option<Arc<dyn MessageSender>>,
    pub statuses: Option<Arc<dyn StatusChanger>>,
    pub tags: Option<Arc<dyn TagManager>>,
    pub webhooks: Option<Arc<dyn WebhookSender>>,
    pub workflows: Option<Arc<dyn WorkflowTrigger>>,
    pub agents: Option<Arc<dyn AgentAssigner>>,
    pub contacts: Option<Arc<dyn ContactUpdater>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(mut self, sender: Arc<dyn MessageSender>) -> Self {
        self.messages = Some(sender);
        self
    }

    pub fn with_statuses(mut self, changer: Arc<dyn StatusChanger>) -> Self {
        self.statuses = Some(changer);
        self
    }

    pub fn with_tags(mut self, manager: Arc<dyn TagManager>) -> Self {
        self.tags = Some(manager);
        self
    }

    pub fn with_webhooks(mut self, sender: Arc<dyn WebhookSender>) -> Self {
        self.webhooks = Some(sender);
        self
    }

    pub fn with_workflows(mut self, trigger: Arc<dyn WorkflowTrigger>) -> Self {
        self.workflows = Some(trigger);
        self
    }

    pub fn with_agents(mut self, assigner: Arc<dyn AgentAssigner>) -> Self {
        self.agents = Some(assigner);
        self
    }

    pub fn with_contacts(mut self, updater: Arc<dyn ContactUpdater>) -> Self {
        self.contacts = Some(updater);
        self
    }
}
