//! Action errors

use crm_automation::ActionType;
use thiserror::Error;

/// Result type for action execution
pub type ActionResult<T> = Result<T, ActionError>;

/// Errors raised while executing a single action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no handler registered for action type {0}")]
    UnknownActionType(ActionType),

    #[error("invalid params for {action_type}: {reason}")]
    InvalidParams {
        action_type: ActionType,
        reason: String,
    },

    #[error("{action_type} requires {target} in the action context")]
    MissingTarget {
        action_type: ActionType,
        target: &'static str,
    },

    #[error("{collaborator} failed: {reason}")]
    Collaborator {
        collaborator: &'static str,
        reason: String,
    },

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook {url} answered with status {status}")]
    WebhookStatus { url: String, status: u16 },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ActionError {
    pub fn invalid_params(action_type: ActionType, reason: impl Into<String>) -> Self {
        ActionError::InvalidParams {
            action_type,
            reason: reason.into(),
        }
    }

    pub fn collaborator(collaborator: &'static str, reason: impl std::fmt::Display) -> Self {
        ActionError::Collaborator {
            collaborator,
            reason: reason.to_string(),
        }
    }

    /// Whether the action itself is malformed, as opposed to a failing call-out
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ActionError::UnknownActionType(_)
                | ActionError::InvalidParams { .. }
                | ActionError::MissingTarget { .. }
        )
    }
}
