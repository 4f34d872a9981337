//! Engine errors

use crm_actions::ActionError;
use crm_automation::{RepositoryError, ScheduleError};
use thiserror::Error;
use uuid::Uuid;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine
///
/// Failures of individual rules are not errors of the call; they are
/// reported in the execution report.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("automation rule not found: {0}")]
    RuleNotFound(Uuid),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("action failed: {0}")]
    Action(#[from] ActionError),

    #[error("delayed action requires a delayed-action scheduler")]
    NoDelayedScheduler,

    #[error("failed to schedule delayed action: {0}")]
    Scheduling(String),

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::RuleNotFound(_))
    }
}
