//! Action types
//!
//! An action is a typed, parameterized effect attached to a rule. Parameters
//! stay untyped here; each handler parses the shape it needs when it runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::trigger::{ParseKindError, Trigger};

/// Kind of effect an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    ChangeStatus,
    AddTag,
    RemoveTag,
    SendWebhook,
    TriggerWorkflow,
    AssignAgent,
    UpdateContactField,
}

impl ActionType {
    pub const ALL: [ActionType; 8] = [
        ActionType::SendMessage,
        ActionType::ChangeStatus,
        ActionType::AddTag,
        ActionType::RemoveTag,
        ActionType::SendWebhook,
        ActionType::TriggerWorkflow,
        ActionType::AssignAgent,
        ActionType::UpdateContactField,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SendMessage => "send_message",
            ActionType::ChangeStatus => "change_status",
            ActionType::AddTag => "add_tag",
            ActionType::RemoveTag => "remove_tag",
            ActionType::SendWebhook => "send_webhook",
            ActionType::TriggerWorkflow => "trigger_workflow",
            ActionType::AssignAgent => "assign_agent",
            ActionType::UpdateContactField => "update_contact_field",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseKindError {
                kind: "action type",
                value: s.to_string(),
            })
    }
}

/// An action attached to a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    /// What the action does
    #[serde(rename = "type")]
    pub action_type: ActionType,

    /// Handler-specific parameters
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, serde_json::Value>,

    /// Minutes to wait before running; 0 runs inline
    #[serde(default)]
    pub delay_minutes: u32,
}

impl RuleAction {
    /// Create an immediate action without parameters
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            params: HashMap::new(),
            delay_minutes: 0,
        }
    }

    /// Add a parameter
    pub fn with_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the delay
    pub fn with_delay(mut self, minutes: u32) -> Self {
        self.delay_minutes = minutes;
        self
    }

    /// Whether the action must be handed to the delayed-action scheduler
    pub fn is_delayed(&self) -> bool {
        self.delay_minutes > 0
    }

    /// Parameters as a JSON object, for typed parsing
    pub fn params_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.params
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

/// Identifiers an action needs to target its effect
///
/// Built by the caller from the trigger occurrence; the engine fills in the
/// rule identity before dispatching. The engine itself never reads the
/// optional targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionContext {
    /// Tenant the occurrence belongs to
    pub tenant_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<Uuid>,

    /// Rule being executed (set by the engine)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,

    /// Free-form data for handlers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ActionContext {
    /// Create a context for a tenant
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_contact(mut self, contact_id: Uuid) -> Self {
        self.contact_id = Some(contact_id);
        self
    }

    pub fn with_channel(mut self, channel_id: Uuid) -> Self {
        self.channel_id = Some(channel_id);
        self
    }

    pub fn with_pipeline(mut self, pipeline_id: Uuid) -> Self {
        self.pipeline_id = Some(pipeline_id);
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
