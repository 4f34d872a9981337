//! Scheduled rule runner
//!
//! Keeps scheduled rules in memory and polls them. On each tick every due
//! rule is run through the engine with the `scheduled` trigger and its
//! execution bookkeeping is updated. Rules that can never fire again are
//! dropped.
//!
//! The tick interval must stay under a minute: once and daily schedules
//! only match during their one-minute window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crm_automation::{ActionContext, EvalContext, ScheduledAutomationRule, Trigger};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{AutomationEngine, RuleOutcome};
use crate::error::EngineResult;

/// Polls scheduled rules and fires the due ones
pub struct ScheduledRuleRunner {
    engine: Arc<AutomationEngine>,
    rules: DashMap<Uuid, ScheduledAutomationRule>,
    tick_interval: Duration,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl ScheduledRuleRunner {
    pub fn new(engine: Arc<AutomationEngine>, tick_interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            engine,
            rules: DashMap::new(),
            tick_interval,
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Add or replace a scheduled rule
    ///
    /// Schedules that are accepted but never evaluated (cron) are rejected.
    pub fn add(&self, rule: ScheduledAutomationRule) -> EngineResult<()> {
        rule.schedule().ensure_supported()?;

        let id = rule.automation().id();
        info!(
            rule_id = %id,
            rule = %rule.automation().name(),
            schedule = %rule.schedule().schedule_type,
            next_execution_at = ?rule.next_execution_at(),
            "Scheduled rule added"
        );
        self.rules.insert(id, rule);
        Ok(())
    }

    pub fn remove(&self, rule_id: Uuid) -> bool {
        self.rules.remove(&rule_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Cached next execution of a rule
    pub fn next_execution_at(&self, rule_id: Uuid) -> Option<DateTime<Utc>> {
        self.rules
            .get(&rule_id)
            .and_then(|rule| rule.next_execution_at())
    }

    /// Fire every rule due at `now`
    ///
    /// Returns the outcomes of the rules fired, in no particular order.
    pub async fn tick(&self, now: DateTime<Utc>) -> Vec<RuleOutcome> {
        // Clone out the due rules so no map shard is held across awaits
        let due: Vec<ScheduledAutomationRule> = self
            .rules
            .iter()
            .filter(|entry| entry.value().is_due(now))
            .map(|entry| entry.value().clone())
            .collect();

        let mut outcomes = Vec::with_capacity(due.len());
        for rule in due {
            let automation = rule.automation();
            let eval_ctx = EvalContext::new()
                .with_fact("scheduled_at", now.to_rfc3339())
                .with_fact("schedule_type", rule.schedule().schedule_type.as_str());
            let mut action_ctx =
                ActionContext::new(automation.tenant_id()).with_trigger(Trigger::Scheduled);
            action_ctx.pipeline_id = automation.pipeline_id();

            let outcome = self.engine.execute_rule(automation, &eval_ctx, &action_ctx).await;
            if outcome.is_failed() {
                warn!(
                    rule_id = %outcome.rule_id,
                    status = ?outcome.status,
                    "Scheduled rule failed"
                );
            }
            outcomes.push(outcome);

            if let Some(mut entry) = self.rules.get_mut(&automation.id()) {
                entry.mark_executed(now);
            }
        }

        self.rules.retain(|id, rule| {
            let keep = !rule.is_exhausted(now);
            if !keep {
                debug!(rule_id = %id, "Scheduled rule exhausted, removing");
            }
            keep
        });

        outcomes
    }

    /// Start polling in the background
    ///
    /// Returns `None` if the runner is already running.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduled rule runner already running");
            return None;
        }

        info!(
            rules = self.rules.len(),
            tick_interval_secs = self.tick_interval.as_secs(),
            "Starting scheduled rule runner"
        );

        let runner = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(runner.tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let outcomes = runner.tick(Utc::now()).await;
                        if !outcomes.is_empty() {
                            debug!(fired = outcomes.len(), "Scheduler tick");
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Received shutdown signal");
                        break;
                    }
                }
            }

            runner.running.store(false, Ordering::SeqCst);
            info!("Scheduled rule runner stopped");
        }))
    }

    /// Stop the polling loop
    pub fn stop(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        info!("Stopping scheduled rule runner");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
