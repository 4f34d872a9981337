//! Domain occurrence adapter
//!
//! Turns CRM occurrences (a session ended, a contact changed status, ...)
//! into engine calls: it picks the trigger, builds the fact map rules are
//! evaluated against and the action context handlers target.
//!
//! Facts provided per occurrence:
//!
//! | Occurrence          | Facts |
//! |---------------------|-------|
//! | session ended/timeout | `session_duration_minutes`, `message_count`, `channel_id` |
//! | no response         | `hours_since_last_message`, `message_count`, `channel_id` |
//! | message received    | `message_count`, `message_content`, `channel_id` |
//! | status changed      | `old_status`, `new_status` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crm_automation::{ActionContext, EvalContext, Trigger};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::{AutomationEngine, ExecutionReport};
use crate::error::EngineResult;

/// A conversation session as seen by automations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub tenant_id: String,
    pub pipeline_id: Uuid,
    pub session_id: Uuid,
    pub contact_id: Uuid,
    #[serde(default)]
    pub channel_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub message_count: u64,
}

impl SessionInfo {
    fn action_context(&self, trigger: Trigger) -> ActionContext {
        let mut ctx = ActionContext::new(self.tenant_id.clone())
            .with_session(self.session_id)
            .with_contact(self.contact_id)
            .with_pipeline(self.pipeline_id)
            .with_trigger(trigger);
        ctx.channel_id = self.channel_id;
        ctx
    }

    fn base_facts(&self) -> EvalContext {
        let mut facts = EvalContext::new().with_fact("message_count", self.message_count);
        if let Some(channel_id) = self.channel_id {
            facts.insert("channel_id", channel_id.to_string());
        }
        facts
    }
}

/// A contact moving between statuses of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub tenant_id: String,
    pub pipeline_id: Uuid,
    pub contact_id: Uuid,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub old_status: String,
    pub new_status: String,
}

/// Adapter from CRM occurrences to [`AutomationEngine`] calls
#[derive(Clone)]
pub struct AutomationIntegration {
    engine: Arc<AutomationEngine>,
}

impl AutomationIntegration {
    pub fn new(engine: Arc<AutomationEngine>) -> Self {
        Self { engine }
    }

    /// A session was closed
    pub async fn on_session_ended(
        &self,
        session: &SessionInfo,
        ended_at: DateTime<Utc>,
    ) -> EngineResult<ExecutionReport> {
        self.session_closed(session, ended_at, Trigger::SessionEnded).await
    }

    /// A session was closed for inactivity
    pub async fn on_session_timeout(
        &self,
        session: &SessionInfo,
        timed_out_at: DateTime<Utc>,
    ) -> EngineResult<ExecutionReport> {
        self.session_closed(session, timed_out_at, Trigger::SessionTimeout)
            .await
    }

    /// The contact has not answered since `last_message_at`
    pub async fn on_no_response(
        &self,
        session: &SessionInfo,
        last_message_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<ExecutionReport> {
        let mut facts = session.base_facts();
        facts.insert(
            "hours_since_last_message",
            (now - last_message_at).num_hours().max(0),
        );

        let ctx = session.action_context(Trigger::NoResponseTimeout);
        self.run(session.pipeline_id, Trigger::NoResponseTimeout, facts, ctx).await
    }

    /// A message arrived in the session; `session.message_count` includes it
    pub async fn on_message_received(
        &self,
        session: &SessionInfo,
        content: &str,
    ) -> EngineResult<ExecutionReport> {
        let mut facts = session.base_facts();
        facts.insert("message_content", content);

        let ctx = session.action_context(Trigger::MessageReceived);
        self.run(session.pipeline_id, Trigger::MessageReceived, facts, ctx).await
    }

    /// A contact's status changed
    pub async fn on_status_changed(&self, change: &StatusChange) -> EngineResult<ExecutionReport> {
        let facts = EvalContext::new()
            .with_fact("old_status", change.old_status.clone())
            .with_fact("new_status", change.new_status.clone());

        let mut ctx = ActionContext::new(change.tenant_id.clone())
            .with_contact(change.contact_id)
            .with_pipeline(change.pipeline_id)
            .with_trigger(Trigger::StatusChanged)
            .with_metadata("old_status", change.old_status.clone())
            .with_metadata("new_status", change.new_status.clone());
        ctx.session_id = change.session_id;

        self.run(change.pipeline_id, Trigger::StatusChanged, facts, ctx)
            .await
    }

    async fn session_closed(
        &self,
        session: &SessionInfo,
        closed_at: DateTime<Utc>,
        trigger: Trigger,
    ) -> EngineResult<ExecutionReport> {
        let mut facts = session.base_facts();
        facts.insert(
            "session_duration_minutes",
            (closed_at - session.started_at).num_minutes().max(0),
        );

        self.run(session.pipeline_id, trigger, facts, session.action_context(trigger))
            .await
    }

    async fn run(
        &self,
        pipeline_id: Uuid,
        trigger: Trigger,
        facts: EvalContext,
        ctx: ActionContext,
    ) -> EngineResult<ExecutionReport> {
        debug!(
            pipeline_id = %pipeline_id,
            trigger = %trigger,
            facts = facts.len(),
            "Dispatching occurrence"
        );
        self.engine
            .evaluate_and_execute(pipeline_id, trigger, &facts, &ctx)
            .await
    }
}
