//! Rule document tests
//!
//! These tests parse rule definitions in the JSON shape used by the rule
//! editor and exercise them end to end: parse, evaluate, export, re-import.

use crm_automation::{
    ActionType, Automation, AutomationType, ConditionGroup, ConditionOperator, EvalContext,
    RuleCondition, RuleExport, ScheduleType, ScheduledRuleConfig, Trigger,
};
use serde_json::json;
use uuid::Uuid;

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_condition_document_with_aliases() {
    let conditions: Vec<RuleCondition> = serde_json::from_value(json!([
        {"field": "status", "operator": "eq", "value": "qualified"},
        {"field": "status", "operator": "not_equals", "value": "lost"},
        {"field": "score", "operator": "lte", "value": 80},
        {"field": "plan", "operator": "in", "value": ["pro", "team"]},
        {"field": "email", "operator": "matches", "value": ".*@corp.com"}
    ]))
    .unwrap();

    assert_eq!(conditions[0].operator, ConditionOperator::Equals);
    assert_eq!(conditions[1].operator, ConditionOperator::NotEquals);
    assert_eq!(conditions[2].operator, ConditionOperator::LessThanOrEqual);
    assert_eq!(conditions[3].operator, ConditionOperator::In);
    assert_eq!(
        conditions[4].operator,
        ConditionOperator::Other("matches".to_string())
    );
}

#[test]
fn test_unknown_operator_never_matches() {
    let mut automation = Automation::new(
        AutomationType::Event,
        None,
        "tenant-a",
        "Regex",
        Trigger::ContactUpdated,
    )
    .unwrap();
    automation.set_conditions(vec![RuleCondition::new("email", "matches", json!(".*"))]);

    let ctx = EvalContext::new().with_fact("email", "a@corp.com");
    assert!(!automation.evaluate_conditions(&ctx));
}

#[test]
fn test_nested_group_document() {
    let group: ConditionGroup = serde_json::from_value(json!({
        "logic": "OR",
        "conditions": [
            {"field": "vip", "operator": "equals", "value": true}
        ],
        "groups": [{
            "logic": "AND",
            "conditions": [
                {"field": "message_count", "operator": "gte", "value": 3},
                {"field": "channel", "operator": "contains", "value": "whats"}
            ]
        }]
    }))
    .unwrap();

    let regular = EvalContext::new()
        .with_fact("vip", false)
        .with_fact("message_count", 4)
        .with_fact("channel", "whatsapp");
    assert!(crm_automation::eval::evaluate_group(&group, &regular));

    let quiet = EvalContext::new()
        .with_fact("vip", false)
        .with_fact("message_count", 1)
        .with_fact("channel", "whatsapp");
    assert!(!crm_automation::eval::evaluate_group(&group, &quiet));
}

// ============================================================================
// Export / import
// ============================================================================

#[test]
fn test_export_then_import_into_new_pipeline() {
    let source_pipeline = Uuid::new_v4();
    let mut source = Automation::new(
        AutomationType::Reengagement,
        Some(source_pipeline),
        "tenant-a",
        "Win back",
        Trigger::SessionTimeout,
    )
    .unwrap();
    source.set_conditions(vec![RuleCondition::new(
        "session_duration_minutes",
        "lt",
        json!(2),
    )]);
    source.set_priority(4);
    source.disable();

    let json = source.export().to_json().unwrap();
    let target_pipeline = Uuid::new_v4();
    let imported = RuleExport::from_json(&json)
        .unwrap()
        .into_automation(AutomationType::Reengagement, Some(target_pipeline), "tenant-b")
        .unwrap();

    assert_ne!(imported.id(), source.id());
    assert_eq!(imported.pipeline_id(), Some(target_pipeline));
    assert_eq!(imported.name(), "Win back");
    assert_eq!(imported.priority(), 4);
    assert_eq!(imported.conditions(), source.conditions());
    // Enabled state is not part of the document
    assert!(imported.is_enabled());
}

#[test]
fn test_action_document() {
    let export = RuleExport::from_json(
        r#"{
            "name": "Escalate",
            "trigger": "payment.failed",
            "actions": [
                {
                    "type": "assign_agent",
                    "params": {"agent_id": "0b5b6b9e-9f49-4a57-9b6e-7c0c3e4f4a01"}
                },
                {
                    "type": "send_webhook",
                    "params": {"url": "https://hooks.example.com/pay"},
                    "delay_minutes": 30
                }
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(export.actions.len(), 2);
    assert_eq!(export.actions[0].action_type, ActionType::AssignAgent);
    assert!(!export.actions[0].is_delayed());
    assert_eq!(export.actions[1].action_type, ActionType::SendWebhook);
    assert_eq!(export.actions[1].delay_minutes, 30);
}

// ============================================================================
// Schedules
// ============================================================================

#[test]
fn test_schedule_document() {
    let schedule: ScheduledRuleConfig = serde_json::from_value(json!({
        "type": "weekly",
        "day_of_week": 1,
        "hour": 9,
        "minute": 30
    }))
    .unwrap();

    assert_eq!(schedule.schedule_type, ScheduleType::Weekly);
    assert!(schedule.validate().is_ok());
}

#[test]
fn test_schedule_document_missing_day() {
    let schedule: ScheduledRuleConfig = serde_json::from_value(json!({
        "type": "monthly",
        "hour": 9,
        "minute": 0
    }))
    .unwrap();

    let err = schedule.validate().unwrap_err();
    assert_eq!(
        err.to_string(),
        "day_of_month is required for monthly schedules"
    );
}
