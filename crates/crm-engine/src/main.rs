//! CRM automation daemon
//!
//! Loads the configuration and the scheduled rules, then runs the
//! scheduled-rule runner until Ctrl-C.
//!
//! Usage: `crm-automation [config.yaml]` (default `automation.yaml`)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use crm_actions::{ActionRegistry, Collaborators, HttpWebhookSender};
use crm_automation::{AutomationRepository, InMemoryAutomationRepository};
use crm_core::DomainEvent;
use crm_engine::{
    load_rule_definitions, AppConfig, AutomationEngine, ScheduledRuleRunner, TokioDelayedScheduler,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_CONFIG: &str = "automation.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let config_path = explicit.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    // A missing default config file means defaults; a missing explicit one is an error
    let config = if explicit.is_some() || config_path.exists() {
        AppConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        AppConfig::default()
    };

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(config = %config_path.display(), "Starting CRM automation");

    let collaborators = Collaborators::new().with_webhooks(Arc::new(HttpWebhookSender::new()?));
    let registry = Arc::new(ActionRegistry::with_builtin(&collaborators));
    info!(action_types = ?registry.action_types(), "Action handlers registered");

    let delayed = Arc::new(TokioDelayedScheduler::new(registry.clone()));
    let repository = Arc::new(InMemoryAutomationRepository::new());
    let engine = Arc::new(
        AutomationEngine::new(repository, registry)
            .with_delayed_scheduler(delayed.clone())
            .with_config(config.engine.clone()),
    );
    let runner = Arc::new(ScheduledRuleRunner::new(
        engine.clone(),
        config.scheduler.tick_interval(),
    ));

    match &config.rules_file {
        Some(rules_file) => {
            let definitions = load_rule_definitions(rules_file)?;
            let now = Utc::now();
            for definition in definitions {
                let mut rule = definition.into_scheduled_rule(now)?;
                engine.repository().save(rule.automation()).await?;
                log_events(rule.automation_mut().drain_events());
                runner.add(rule)?;
            }
            info!(rules = runner.len(), file = %rules_file.display(), "Scheduled rules loaded");
        }
        None => warn!("No rules_file configured, nothing is scheduled"),
    }

    let handle = runner.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    runner.stop();
    delayed.shutdown();
    if let Some(handle) = handle {
        handle.await?;
    }

    Ok(())
}

fn log_events(events: Vec<DomainEvent>) {
    for event in events {
        info!(
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            tenant_id = %event.tenant_id,
            "Domain event"
        );
    }
}
