//! Daemon configuration
//!
//! Loaded from a YAML document. Every field has a default, so an empty file
//! is a valid configuration:
//!
//! ```yaml
//! engine:
//!   parallel_rules: false
//! scheduler:
//!   tick_interval_secs: 30
//! logging:
//!   filter: info,crm_engine=debug
//! rules_file: rules.yaml
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use crm_automation::{
    AutomationResult, AutomationType, RuleExport, ScheduledAutomationRule, ScheduledRuleConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,

    /// Scheduled rules to load at startup, relative to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,
}

/// Engine behavior
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluate the rules of one trigger concurrently
    ///
    /// Actions of a single rule still run in order.
    pub parallel_rules: bool,
}

/// Scheduled-rule polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_yaml(&content, path)?;

        if let Some(rules_file) = &config.rules_file {
            if rules_file.is_relative() {
                if let Some(dir) = path.parent() {
                    config.rules_file = Some(dir.join(rules_file));
                }
            }
        }

        Ok(config)
    }

    /// Parse and validate a YAML document; `source` is used in errors
    pub fn from_yaml(content: &str, source: &Path) -> ConfigResult<Self> {
        // serde_yaml reads an empty document as null, not as an empty mapping
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
                path: source.to_path_buf(),
                source: e,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let tick = self.scheduler.tick_interval_secs;
        if !(1..=60).contains(&tick) {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.tick_interval_secs".to_string(),
                reason: format!("must be between 1 and 60 seconds, got {tick}"),
            });
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "logging.filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// One scheduled rule in the rules file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledRuleDefinition {
    pub tenant_id: String,

    #[serde(default)]
    pub pipeline_id: Option<Uuid>,

    #[serde(default = "default_automation_type")]
    pub automation_type: AutomationType,

    pub rule: RuleExport,
    pub schedule: ScheduledRuleConfig,
}

fn default_automation_type() -> AutomationType {
    AutomationType::Scheduled
}

impl ScheduledRuleDefinition {
    /// Build the scheduled rule, validating both the rule and its schedule
    pub fn into_scheduled_rule(
        self,
        now: DateTime<Utc>,
    ) -> AutomationResult<ScheduledAutomationRule> {
        let automation =
            self.rule
                .into_automation(self.automation_type, self.pipeline_id, self.tenant_id)?;
        ScheduledAutomationRule::new(automation, self.schedule, now)
    }
}

/// Load the list of scheduled rule definitions from a YAML file
pub fn load_rule_definitions(path: impl AsRef<Path>) -> ConfigResult<Vec<ScheduledRuleDefinition>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crm_automation::{ScheduleType, Trigger};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_yaml("", Path::new("automation.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(!config.engine.parallel_rules);
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_document() {
        let config = AppConfig::from_yaml(
            "engine:\n  parallel_rules: true\n",
            Path::new("automation.yaml"),
        )
        .unwrap();
        assert!(config.engine.parallel_rules);
        assert_eq!(config.scheduler.tick_interval_secs, 30);
    }

    #[test]
    fn test_tick_interval_out_of_range() {
        let err = AppConfig::from_yaml(
            "scheduler:\n  tick_interval_secs: 90\n",
            Path::new("automation.yaml"),
        )
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => {
                assert_eq!(key, "scheduler.tick_interval_secs")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = AppConfig::from_yaml("engine: [", Path::new("broken.yaml")).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_load_resolves_rules_file_relative_to_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("automation.yaml");
        fs::write(&path, "rules_file: rules.yaml\nlogging:\n  filter: debug\n").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.rules_file, Some(dir.path().join("rules.yaml")));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/automation.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_rule_definitions() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- tenant_id: tenant-a
  rule:
    name: Weekly digest
    trigger: scheduled
    actions:
      - type: send_webhook
        params:
          url: https://hooks.example.com/digest
  schedule:
    type: weekly
    day_of_week: 1
    hour: 8
    minute: 0
"#
        )
        .unwrap();

        let definitions = load_rule_definitions(file.path()).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].automation_type, AutomationType::Scheduled);
        assert_eq!(definitions[0].schedule.schedule_type, ScheduleType::Weekly);

        let now = Utc.with_ymd_and_hms(2024, 6, 5, 12, 0, 0).unwrap();
        let rule = definitions[0].clone().into_scheduled_rule(now).unwrap();
        assert_eq!(rule.automation().trigger(), Trigger::Scheduled);
        // Wednesday noon, next Monday 08:00
        assert_eq!(
            rule.next_execution_at(),
            Some(Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_definition_with_invalid_schedule() {
        let definition: ScheduledRuleDefinition = serde_yaml::from_str(
            r#"
tenant_id: tenant-a
rule:
  name: Broken
  trigger: scheduled
schedule:
  type: daily
  hour: 25
"#,
        )
        .unwrap();

        assert!(definition.into_scheduled_rule(Utc::now()).is_err());
    }
}
