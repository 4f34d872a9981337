//! Rule export and import
//!
//! A rule travels between tenants and pipelines as a JSON object with the
//! keys `name`, `description`, `trigger`, `conditions`, `actions` and
//! `priority`. Identity, tenant, pipeline and enabled state are not part of
//! the document; they are supplied on import.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::action::RuleAction;
use crate::automation::{Automation, AutomationResult};
use crate::condition::RuleCondition;
use crate::trigger::{AutomationType, Trigger};

/// Portable form of an automation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleExport {
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
}

impl RuleExport {
    /// Parse an exported rule document
    pub fn from_json(json: &str) -> AutomationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the document as pretty-printed JSON
    pub fn to_json(&self) -> AutomationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Create a new automation from the document
    ///
    /// The result is a fresh, enabled rule with its own identity and the
    /// usual creation event pending.
    pub fn into_automation(
        self,
        automation_type: AutomationType,
        pipeline_id: Option<Uuid>,
        tenant_id: impl Into<String>,
    ) -> AutomationResult<Automation> {
        let mut automation =
            Automation::new(automation_type, pipeline_id, tenant_id, self.name, self.trigger)?;
        automation.set_description(self.description);
        automation.set_conditions(self.conditions);
        automation.set_actions(self.actions);
        automation.set_priority(self.priority);

        debug!(automation_id = %automation.id(), "Imported automation");
        Ok(automation)
    }
}

impl From<&Automation> for RuleExport {
    fn from(automation: &Automation) -> Self {
        Self {
            name: automation.name().to_string(),
            description: automation.description().to_string(),
            trigger: automation.trigger(),
            conditions: automation.conditions().to_vec(),
            actions: automation.actions().to_vec(),
            priority: automation.priority(),
        }
    }
}

impl Automation {
    /// Export the rule as a portable document
    pub fn export(&self) -> RuleExport {
        RuleExport::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;
    use crate::automation::AutomationError;
    use serde_json::json;

    #[test]
    fn test_export_keys() {
        let mut automation = Automation::new(
            AutomationType::FollowUp,
            Some(Uuid::new_v4()),
            "tenant-a",
            "Nudge",
            Trigger::NoResponseTimeout,
        )
        .unwrap();
        automation.set_description("Ping quiet leads");
        automation.set_conditions(vec![RuleCondition::new(
            "hours_since_last_message",
            "gte",
            json!(24),
        )]);
        automation.set_actions(vec![RuleAction::new(ActionType::SendMessage)
            .with_param("content", "Still interested?")
            .with_delay(10)]);
        automation.set_priority(2);

        let value = serde_json::to_value(automation.export()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["actions", "conditions", "description", "name", "priority", "trigger"]
        );
        assert_eq!(value["trigger"], "no_response.timeout");
        assert_eq!(value["actions"][0]["type"], "send_message");
        assert_eq!(value["actions"][0]["delay_minutes"], 10);
        assert_eq!(value["conditions"][0]["operator"], "gte");
    }

    #[test]
    fn test_import_into_other_pipeline() {
        let json = r#"{
            "name": "Tag engaged",
            "description": "",
            "trigger": "session.ended",
            "conditions": [{"field": "message_count", "operator": "gt", "value": 5}],
            "actions": [{"type": "add_tag", "params": {"tag": "engaged"}}],
            "priority": 1
        }"#;

        let pipeline = Uuid::new_v4();
        let automation = RuleExport::from_json(json)
            .unwrap()
            .into_automation(AutomationType::PipelineAutomation, Some(pipeline), "tenant-b")
            .unwrap();

        assert_eq!(automation.pipeline_id(), Some(pipeline));
        assert_eq!(automation.tenant_id(), "tenant-b");
        assert_eq!(automation.trigger(), Trigger::SessionEnded);
        assert_eq!(automation.conditions().len(), 1);
        assert_eq!(automation.actions()[0].action_type, ActionType::AddTag);
        assert_eq!(automation.priority(), 1);
        assert!(automation.is_enabled());
    }

    #[test]
    fn test_import_rejects_unknown_trigger() {
        let err = RuleExport::from_json(r#"{"name": "x", "trigger": "moon.rising"}"#).unwrap_err();
        assert!(matches!(err, AutomationError::Document(_)));
    }

    #[test]
    fn test_import_still_validates_construction() {
        let export =
            RuleExport::from_json(r#"{"name": "x", "trigger": "status.changed"}"#).unwrap();
        let err = export
            .into_automation(AutomationType::Onboarding, None, "tenant-a")
            .unwrap_err();
        assert!(matches!(err, AutomationError::PipelineRequired(_)));
    }
}
