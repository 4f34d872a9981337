//! Automation aggregate
//!
//! An automation ties a trigger to an ordered list of conditions and an
//! ordered list of actions. It is the unit of consistency: conditions and
//! actions have no identity of their own and only change through the
//! aggregate's setters, each of which records a domain event when (and only
//! when) the state actually changes.

use chrono::{DateTime, Utc};
use crm_core::{DomainEvent, EventBuffer, EventData};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::action::RuleAction;
use crate::condition::RuleCondition;
use crate::eval::{self, EvalContext};
use crate::events::{
    AutomationActionsUpdated, AutomationConditionsUpdated, AutomationCreated,
    AutomationDescriptionUpdated, AutomationDisabled, AutomationEnabled, AutomationPriorityChanged,
};
use crate::schedule::ScheduleError;
use crate::trigger::{AutomationType, ParseKindError, Trigger};

/// Automation errors
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("pipeline_id is required for {0} automations")]
    PipelineRequired(AutomationType),

    #[error(transparent)]
    UnknownKind(#[from] ParseKindError),

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("invalid rule document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Result type for automation operations
pub type AutomationResult<T> = Result<T, AutomationError>;

/// Persisted state of an automation
///
/// Repositories store and load this; [`Automation::reconstruct`] rebuilds
/// the aggregate from it without recording events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationSnapshot {
    pub id: Uuid,
    pub automation_type: AutomationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<Uuid>,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    #[serde(default)]
    pub actions: Vec<RuleAction>,
    #[serde(default)]
    pub priority: u32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Automation rule aggregate
#[derive(Debug, Clone)]
pub struct Automation {
    id: Uuid,
    automation_type: AutomationType,
    pipeline_id: Option<Uuid>,
    tenant_id: String,
    name: String,
    description: String,
    trigger: Trigger,
    conditions: Vec<RuleCondition>,
    actions: Vec<RuleAction>,
    priority: u32,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: EventBuffer,
}

impl Automation {
    /// Create a new, enabled automation
    ///
    /// Records an `automation.created` event. Pipeline-scoped types require
    /// a non-nil pipeline id.
    pub fn new(
        automation_type: AutomationType,
        pipeline_id: Option<Uuid>,
        tenant_id: impl Into<String>,
        name: impl Into<String>,
        trigger: Trigger,
    ) -> AutomationResult<Self> {
        let tenant_id = tenant_id.into();
        let name = name.into();

        if tenant_id.trim().is_empty() {
            return Err(AutomationError::MissingField { field: "tenant_id" });
        }
        if name.trim().is_empty() {
            return Err(AutomationError::MissingField { field: "name" });
        }
        if automation_type.is_pipeline_scoped() && !pipeline_id.is_some_and(|p| !p.is_nil()) {
            return Err(AutomationError::PipelineRequired(automation_type));
        }

        let now = Utc::now();
        let mut automation = Self {
            id: Uuid::new_v4(),
            automation_type,
            pipeline_id,
            tenant_id,
            name,
            description: String::new(),
            trigger,
            conditions: Vec::new(),
            actions: Vec::new(),
            priority: 0,
            enabled: true,
            created_at: now,
            updated_at: now,
            events: EventBuffer::new(),
        };

        automation.record(&AutomationCreated {
            automation_id: automation.id,
            automation_type,
            pipeline_id,
            name: automation.name.clone(),
            trigger,
        });

        debug!(
            automation_id = %automation.id,
            automation_type = %automation_type,
            trigger = %trigger,
            "Created automation"
        );
        Ok(automation)
    }

    /// Rebuild an automation from persisted state
    pub fn reconstruct(snapshot: AutomationSnapshot) -> Self {
        Self {
            id: snapshot.id,
            automation_type: snapshot.automation_type,
            pipeline_id: snapshot.pipeline_id,
            tenant_id: snapshot.tenant_id,
            name: snapshot.name,
            description: snapshot.description,
            trigger: snapshot.trigger,
            conditions: snapshot.conditions,
            actions: snapshot.actions,
            priority: snapshot.priority,
            enabled: snapshot.enabled,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: EventBuffer::new(),
        }
    }

    /// Current state, for persistence
    pub fn snapshot(&self) -> AutomationSnapshot {
        AutomationSnapshot {
            id: self.id,
            automation_type: self.automation_type,
            pipeline_id: self.pipeline_id,
            tenant_id: self.tenant_id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            trigger: self.trigger,
            conditions: self.conditions.clone(),
            actions: self.actions.clone(),
            priority: self.priority,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn automation_type(&self) -> AutomationType {
        self.automation_type
    }

    pub fn pipeline_id(&self) -> Option<Uuid> {
        self.pipeline_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn conditions(&self) -> &[RuleCondition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[RuleAction] {
        &self.actions
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // --- Mutations ---

    /// Replace the condition list
    pub fn set_conditions(&mut self, conditions: Vec<RuleCondition>) {
        if self.conditions == conditions {
            return;
        }
        self.conditions = conditions;
        self.touch();
        self.record(&AutomationConditionsUpdated {
            automation_id: self.id,
            condition_count: self.conditions.len(),
        });
    }

    /// Replace the action list
    pub fn set_actions(&mut self, actions: Vec<RuleAction>) {
        if self.actions == actions {
            return;
        }
        self.actions = actions;
        self.touch();
        self.record(&AutomationActionsUpdated {
            automation_id: self.id,
            action_count: self.actions.len(),
        });
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        if self.description == description {
            return;
        }
        self.description = description;
        self.touch();
        self.record(&AutomationDescriptionUpdated {
            automation_id: self.id,
        });
    }

    pub fn set_priority(&mut self, priority: u32) {
        if self.priority == priority {
            return;
        }
        let old_priority = self.priority;
        self.priority = priority;
        self.touch();
        self.record(&AutomationPriorityChanged {
            automation_id: self.id,
            old_priority,
            new_priority: priority,
        });
    }

    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.touch();
        self.record(&AutomationEnabled {
            automation_id: self.id,
        });
    }

    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.touch();
        self.record(&AutomationDisabled {
            automation_id: self.id,
        });
    }

    // --- Evaluation ---

    /// Check the rule's conditions against a fact context (implicit AND)
    pub fn evaluate_conditions(&self, ctx: &EvalContext) -> bool {
        eval::evaluate_all(&self.conditions, ctx)
    }

    // --- Events ---

    /// Events recorded since the last drain
    pub fn pending_events(&self) -> &[DomainEvent] {
        self.events.pending()
    }

    /// Return and clear recorded events; call after persisting
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        self.events.drain()
    }

    fn record<T: EventData>(&mut self, data: &T) {
        let id = self.id.to_string();
        self.events.record(data, &id, &self.tenant_id);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
