//! Automation rules
//!
//! This crate provides the rule model of the CRM automation engine.
//! Automations are trigger-driven rules that run actions when their
//! conditions match the facts of an occurrence.
//!
//! # Architecture
//!
//! ```text
//! AUTOMATION = TRIGGER → CONDITIONS → ACTIONS
//! ```
//!
//! - **Triggers**: Named occurrences (session ended, status changed, ...)
//! - **Conditions**: Field/operator/value predicates over an evaluation context
//! - **Actions**: Typed effects, run inline or after a delay (handled by crm-actions)
//! - **Schedules**: Recurrence descriptions for rules fired by the clock
//!
//! # Key Types
//!
//! - [`Automation`] - The rule aggregate
//! - [`RuleCondition`] / [`ConditionGroup`] - Conditions and nested AND/OR groups
//! - [`RuleAction`] / [`ActionContext`] - Actions and their targets
//! - [`ScheduledRuleConfig`] / [`ScheduledAutomationRule`] - Recurrence scheduling
//! - [`AutomationRepository`] - Persistence contract

pub mod action;
pub mod automation;
pub mod condition;
pub mod eval;
pub mod events;
pub mod export;
pub mod repository;
pub mod schedule;
pub mod trigger;

pub use action::{ActionContext, ActionType, RuleAction};
pub use automation::{Automation, AutomationError, AutomationResult, AutomationSnapshot};
pub use condition::{ConditionGroup, ConditionLogic, ConditionOperator, RuleCondition};
pub use eval::EvalContext;
pub use export::RuleExport;
pub use repository::{
    AutomationRepository, InMemoryAutomationRepository, RepositoryError, RepositoryResult,
};
pub use schedule::{
    ScheduleError, ScheduleResult, ScheduleType, ScheduledAutomationRule, ScheduledRuleConfig,
};
pub use trigger::{AutomationType, ParseKindError, Trigger};
