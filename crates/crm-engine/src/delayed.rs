//! Delayed actions
//!
//! Actions with a delay are not run by the engine. They are handed to a
//! [`DelayedActionScheduler`] and the engine moves on without waiting.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crm_actions::ActionExecutor;
use crm_automation::{ActionContext, RuleAction};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{EngineError, EngineResult};

/// An action waiting for its time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedAction {
    pub action: RuleAction,
    pub context: ActionContext,
    pub run_at: DateTime<Utc>,
}

impl DelayedAction {
    /// Schedule `action` for `delay_minutes` after `now`
    pub fn after_delay(action: RuleAction, context: ActionContext, now: DateTime<Utc>) -> Self {
        let run_at = now + chrono::Duration::minutes(i64::from(action.delay_minutes));
        Self {
            action,
            context,
            run_at,
        }
    }
}

/// Accepts delayed actions for later execution
///
/// Durability and retries are the implementation's business.
#[async_trait]
pub trait DelayedActionScheduler: Send + Sync {
    async fn schedule(&self, delayed: DelayedAction) -> EngineResult<()>;
}

/// In-process scheduler
///
/// Spawns one sleeping task per action. Pending actions are lost when the
/// process exits.
pub struct TokioDelayedScheduler {
    executor: Arc<dyn ActionExecutor>,
    tasks: Mutex<JoinSet<()>>,
}

impl TokioDelayedScheduler {
    pub fn new(executor: Arc<dyn ActionExecutor>) -> Self {
        Self {
            executor,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Number of actions not yet run
    pub fn pending(&self) -> usize {
        match self.tasks.lock() {
            Ok(mut tasks) => {
                while tasks.try_join_next().is_some() {}
                tasks.len()
            }
            Err(_) => 0,
        }
    }

    /// Drop every pending action
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            info!(pending = tasks.len(), "Cancelling delayed actions");
            tasks.abort_all();
        }
    }
}

#[async_trait]
impl DelayedActionScheduler for TokioDelayedScheduler {
    async fn schedule(&self, delayed: DelayedAction) -> EngineResult<()> {
        let wait = (delayed.run_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let executor = self.executor.clone();

        debug!(
            action_type = %delayed.action.action_type,
            rule_id = ?delayed.context.rule_id,
            run_at = %delayed.run_at,
            "Scheduling delayed action"
        );

        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| EngineError::Scheduling("delayed task set poisoned".to_string()))?;
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            tokio::time::sleep(wait).await;
            match executor.execute(&delayed.action, &delayed.context).await {
                Ok(()) => debug!(
                    action_type = %delayed.action.action_type,
                    rule_id = ?delayed.context.rule_id,
                    "Delayed action executed"
                ),
                Err(e) => error!(
                    action_type = %delayed.action.action_type,
                    rule_id = ?delayed.context.rule_id,
                    error = %e,
                    "Delayed action failed"
                ),
            }
        });

        Ok(())
    }
}

impl Drop for TokioDelayedScheduler {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            tasks.abort_all();
        }
    }
}
