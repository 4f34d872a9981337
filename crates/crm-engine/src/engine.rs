//! Automation engine
//!
//! Orchestrates the trigger → conditions → actions pipeline for one
//! occurrence:
//!
//! 1. load the rules of `(pipeline, trigger)` from the repository
//! 2. keep the enabled ones, in repository order
//! 3. per rule, evaluate conditions and run its actions in order
//!
//! A failing action stops the remaining actions of its rule only. Rule
//! failures are collected in the [`ExecutionReport`], never returned as
//! errors of the call.

use std::sync::Arc;

use chrono::Utc;
use crm_actions::ActionExecutor;
use crm_automation::{
    ActionContext, Automation, AutomationRepository, EvalContext, RuleAction, Trigger,
};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::delayed::{DelayedAction, DelayedActionScheduler};
use crate::error::{EngineError, EngineResult};

/// What happened to one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleStatus {
    /// Conditions passed and every action ran or was handed off
    Executed,
    ConditionsNotMet,
    /// Rule is disabled (manual runs only)
    Skipped,
    /// Action `action_index` failed; later actions did not run
    Failed { action_index: usize, error: String },
}

/// Per-rule result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule_id: Uuid,
    pub rule_name: String,
    #[serde(flatten)]
    pub status: RuleStatus,
    pub actions_executed: usize,
    pub actions_delayed: usize,
}

impl RuleOutcome {
    fn new(automation: &Automation, status: RuleStatus) -> Self {
        Self {
            rule_id: automation.id(),
            rule_name: automation.name().to_string(),
            status,
            actions_executed: 0,
            actions_delayed: 0,
        }
    }

    pub fn is_executed(&self) -> bool {
        self.status == RuleStatus::Executed
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RuleStatus::Failed { .. })
    }
}

/// Result of one `evaluate_and_execute` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub trigger: Trigger,
    pub pipeline_id: Uuid,
    /// Enabled rules whose conditions were evaluated
    pub rules_evaluated: usize,
    /// Rules whose conditions passed and whose actions all succeeded
    pub rules_executed: usize,
    /// In evaluation order
    pub outcomes: Vec<RuleOutcome>,
}

impl ExecutionReport {
    fn new(trigger: Trigger, pipeline_id: Uuid, outcomes: Vec<RuleOutcome>) -> Self {
        Self {
            trigger,
            pipeline_id,
            rules_evaluated: outcomes.len(),
            rules_executed: outcomes.iter().filter(|o| o.is_executed()).count(),
            outcomes,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Delayed actions handed off across all rules
    pub fn actions_delayed(&self) -> usize {
        self.outcomes.iter().map(|o| o.actions_delayed).sum()
    }

    pub fn outcome(&self, rule_id: Uuid) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule_id == rule_id)
    }
}

/// Rule orchestration engine
///
/// Holds no state between calls; it can be shared freely.
pub struct AutomationEngine {
    repository: Arc<dyn AutomationRepository>,
    executor: Arc<dyn ActionExecutor>,
    delayed: Option<Arc<dyn DelayedActionScheduler>>,
    config: EngineConfig,
}

impl AutomationEngine {
    pub fn new(
        repository: Arc<dyn AutomationRepository>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            repository,
            executor,
            delayed: None,
            config: EngineConfig::default(),
        }
    }

    /// Hand delayed actions to `scheduler`
    ///
    /// Without one, a rule with a delayed action fails at that action.
    pub fn with_delayed_scheduler(mut self, scheduler: Arc<dyn DelayedActionScheduler>) -> Self {
        self.delayed = Some(scheduler);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(&self) -> &Arc<dyn AutomationRepository> {
        &self.repository
    }

    /// Run every enabled rule of `(pipeline_id, trigger)` against `eval_ctx`
    ///
    /// Fails only when the rules cannot be loaded.
    #[instrument(skip(self, eval_ctx, action_ctx), fields(tenant_id = %action_ctx.tenant_id))]
    pub async fn evaluate_and_execute(
        &self,
        pipeline_id: Uuid,
        trigger: Trigger,
        eval_ctx: &EvalContext,
        action_ctx: &ActionContext,
    ) -> EngineResult<ExecutionReport> {
        let rules = self
            .repository
            .find_by_pipeline_and_trigger(pipeline_id, trigger)
            .await?;

        let enabled: Vec<Automation> = rules.into_iter().filter(|r| r.is_enabled()).collect();
        if enabled.is_empty() {
            debug!("No enabled rules for trigger");
            return Ok(ExecutionReport::new(trigger, pipeline_id, Vec::new()));
        }

        debug!(rules = enabled.len(), "Evaluating rules");

        let outcomes = if self.config.parallel_rules {
            join_all(
                enabled
                    .iter()
                    .map(|rule| self.execute_rule(rule, eval_ctx, action_ctx)),
            )
            .await
        } else {
            let mut outcomes = Vec::with_capacity(enabled.len());
            for rule in &enabled {
                outcomes.push(self.execute_rule(rule, eval_ctx, action_ctx).await);
            }
            outcomes
        };

        let report = ExecutionReport::new(trigger, pipeline_id, outcomes);
        info!(
            rules_evaluated = report.rules_evaluated,
            rules_executed = report.rules_executed,
            failed = report.failures().count(),
            "Trigger processed"
        );
        Ok(report)
    }

    /// Run a single rule by id, regardless of its trigger
    ///
    /// Disabled rules are reported as skipped.
    pub async fn trigger_rule(
        &self,
        rule_id: Uuid,
        eval_ctx: &EvalContext,
        action_ctx: &ActionContext,
    ) -> EngineResult<RuleOutcome> {
        let rule = self.repository.find_by_id(rule_id).await.map_err(|e| {
            if e.is_not_found() {
                EngineError::RuleNotFound(rule_id)
            } else {
                EngineError::Repository(e)
            }
        })?;

        if !rule.is_enabled() {
            debug!(rule_id = %rule_id, "Rule is disabled, not triggering");
            return Ok(RuleOutcome::new(&rule, RuleStatus::Skipped));
        }

        Ok(self.execute_rule(&rule, eval_ctx, action_ctx).await)
    }

    /// Evaluate one rule and run its actions
    ///
    /// The rule's enabled flag is not checked here.
    pub async fn execute_rule(
        &self,
        rule: &Automation,
        eval_ctx: &EvalContext,
        action_ctx: &ActionContext,
    ) -> RuleOutcome {
        if !rule.evaluate_conditions(eval_ctx) {
            debug!(rule_id = %rule.id(), rule = %rule.name(), "Conditions not met");
            return RuleOutcome::new(rule, RuleStatus::ConditionsNotMet);
        }

        let ctx = rule_context(rule, action_ctx);
        let mut outcome = RuleOutcome::new(rule, RuleStatus::Executed);

        for (index, action) in rule.actions().iter().enumerate() {
            let result = if action.is_delayed() {
                self.hand_off(action, &ctx).await.map(|()| {
                    outcome.actions_delayed += 1;
                })
            } else {
                self.executor
                    .execute(action, &ctx)
                    .await
                    .map_err(EngineError::from)
                    .map(|()| {
                        outcome.actions_executed += 1;
                    })
            };

            if let Err(e) = result {
                warn!(
                    rule_id = %rule.id(),
                    rule = %rule.name(),
                    action_index = index,
                    action_type = %action.action_type,
                    error = %e,
                    "Rule action failed, skipping remaining actions"
                );
                outcome.status = RuleStatus::Failed {
                    action_index: index,
                    error: e.to_string(),
                };
                return outcome;
            }
        }

        info!(
            rule_id = %rule.id(),
            rule = %rule.name(),
            actions_executed = outcome.actions_executed,
            actions_delayed = outcome.actions_delayed,
            "Rule executed"
        );
        outcome
    }

    async fn hand_off(&self, action: &RuleAction, ctx: &ActionContext) -> EngineResult<()> {
        let scheduler = self.delayed.as_ref().ok_or(EngineError::NoDelayedScheduler)?;
        scheduler
            .schedule(DelayedAction::after_delay(action.clone(), ctx.clone(), Utc::now()))
            .await
    }
}

/// The caller's action context, stamped with the rule's identity
fn rule_context(rule: &Automation, action_ctx: &ActionContext) -> ActionContext {
    let mut ctx = action_ctx.clone();
    ctx.rule_id = Some(rule.id());
    ctx.tenant_id = rule.tenant_id().to_string();
    if let Some(pipeline_id) = rule.pipeline_id() {
        ctx.pipeline_id = Some(pipeline_id);
    }
    if ctx.trigger.is_none() {
        ctx.trigger = Some(rule.trigger());
    }
    ctx
}
