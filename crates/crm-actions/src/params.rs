//! Typed action parameters
//!
//! Rule actions carry an untyped `params` map. Each action type has a
//! parameter struct here; [`parse`] turns the map into that struct and runs
//! its checks, so a missing or mistyped parameter is an
//! [`ActionError::InvalidParams`] rather than a crash.

use std::collections::HashMap;

use crm_automation::{ActionType, RuleAction};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ActionError, ActionResult};

/// Parameters of one action type
pub trait ActionParams: DeserializeOwned {
    /// Semantic checks beyond the shape serde enforces
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Parse and validate the params of `action`
pub fn parse<P: ActionParams>(action: &RuleAction) -> ActionResult<P> {
    let params: P = serde_json::from_value(action.params_value())
        .map_err(|e| ActionError::invalid_params(action.action_type, e.to_string()))?;
    params
        .validate()
        .map_err(|reason| ActionError::invalid_params(action.action_type, reason))?;
    Ok(params)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(())
    }
}

/// `send_message`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendMessageParams {
    pub content: String,

    /// Overrides the channel of the action context
    #[serde(default)]
    pub channel_id: Option<Uuid>,
}

impl ActionParams for SendMessageParams {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("content", &self.content)
    }
}

/// `change_status`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeStatusParams {
    pub status: String,
}

impl ActionParams for ChangeStatusParams {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("status", &self.status)
    }
}

/// `add_tag` and `remove_tag`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagParams {
    pub tag: String,
}

impl ActionParams for TagParams {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("tag", &self.tag)
    }
}

/// HTTP methods a webhook may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    #[serde(alias = "post")]
    Post,
    #[serde(alias = "put")]
    Put,
    #[serde(alias = "patch")]
    Patch,
}

impl WebhookMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookMethod::Post => "POST",
            WebhookMethod::Put => "PUT",
            WebhookMethod::Patch => "PATCH",
        }
    }
}

/// `send_webhook`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookParams {
    pub url: String,

    #[serde(default)]
    pub method: WebhookMethod,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request body; defaults to the action context
    #[serde(default)]
    pub payload: Option<Value>,
}

impl ActionParams for WebhookParams {
    fn validate(&self) -> Result<(), String> {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            Ok(())
        } else {
            Err(format!("url must be http(s), got {:?}", self.url))
        }
    }
}

/// `trigger_workflow`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggerWorkflowParams {
    pub workflow_id: String,

    #[serde(default)]
    pub input: HashMap<String, Value>,
}

impl ActionParams for TriggerWorkflowParams {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("workflow_id", &self.workflow_id)
    }
}

/// `assign_agent`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssignAgentParams {
    pub agent_id: Uuid,
}

impl ActionParams for AssignAgentParams {}

/// `update_contact_field`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateContactFieldParams {
    pub field: String,
    pub value: Value,
}

impl ActionParams for UpdateContactFieldParams {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("field", &self.field)
    }
}

/// Reject an action routed to the handler of another type
pub(crate) fn expect_type(action: &RuleAction, expected: ActionType) -> ActionResult<()> {
    if action.action_type == expected {
        Ok(())
    } else {
        Err(ActionError::invalid_params(
            expected,
            format!("handler received a {} action", action.action_type),
        ))
    }
}
