//! Automation engine
//!
//! This crate wires rules, actions and schedules together:
//!
//! - [`AutomationEngine`] - runs the rules of a trigger occurrence
//! - [`AutomationIntegration`] - turns CRM occurrences into engine calls
//! - [`ScheduledRuleRunner`] - fires scheduled rules on a polling loop
//! - [`DelayedActionScheduler`] - contract for actions that run later,
//!   with the in-process [`TokioDelayedScheduler`]
//! - [`AppConfig`] - YAML configuration of the `crm-automation` daemon
//!
//! Logging goes through `tracing`; nothing is emitted unless the host
//! installs a subscriber.

pub mod config;
pub mod delayed;
pub mod engine;
pub mod error;
pub mod integration;
pub mod runner;

pub use config::{
    load_rule_definitions, AppConfig, ConfigError, ConfigResult, EngineConfig, LoggingConfig,
    ScheduledRuleDefinition, SchedulerConfig,
};
pub use delayed::{DelayedAction, DelayedActionScheduler, TokioDelayedScheduler};
pub use engine::{AutomationEngine, ExecutionReport, RuleOutcome, RuleStatus};
pub use error::{EngineError, EngineResult};
pub use integration::{AutomationIntegration, SessionInfo, StatusChange};
pub use runner::ScheduledRuleRunner;
