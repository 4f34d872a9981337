//! Domain events recorded by the automation aggregate

use crm_core::EventData;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trigger::{AutomationType, Trigger};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationCreated {
    pub automation_id: Uuid,
    pub automation_type: AutomationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<Uuid>,
    pub name: String,
    pub trigger: Trigger,
}

impl EventData for AutomationCreated {
    fn event_type() -> &'static str {
        "automation.created"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConditionsUpdated {
    pub automation_id: Uuid,
    pub condition_count: usize,
}

impl EventData for AutomationConditionsUpdated {
    fn event_type() -> &'static str {
        "automation.conditions_updated"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationActionsUpdated {
    pub automation_id: Uuid,
    pub action_count: usize,
}

impl EventData for AutomationActionsUpdated {
    fn event_type() -> &'static str {
        "automation.actions_updated"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationDescriptionUpdated {
    pub automation_id: Uuid,
}

impl EventData for AutomationDescriptionUpdated {
    fn event_type() -> &'static str {
        "automation.description_updated"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationPriorityChanged {
    pub automation_id: Uuid,
    pub old_priority: u32,
    pub new_priority: u32,
}

impl EventData for AutomationPriorityChanged {
    fn event_type() -> &'static str {
        "automation.priority_changed"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationEnabled {
    pub automation_id: Uuid,
}

impl EventData for AutomationEnabled {
    fn event_type() -> &'static str {
        "automation.enabled"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationDisabled {
    pub automation_id: Uuid,
}

impl EventData for AutomationDisabled {
    fn event_type() -> &'static str {
        "automation.disabled"
    }
}
