//! Trigger and automation type definitions
//!
//! A trigger names the occurrence that makes a rule eligible for evaluation.
//! The automation type classifies a rule and decides whether it must be
//! bound to a pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown trigger or automation type name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseKindError {
    pub kind: &'static str,
    pub value: String,
}

/// Occurrence that makes a rule eligible for evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    #[serde(rename = "session.started")]
    SessionStarted,
    #[serde(rename = "session.ended")]
    SessionEnded,
    #[serde(rename = "session.timeout")]
    SessionTimeout,
    #[serde(rename = "message.received")]
    MessageReceived,
    #[serde(rename = "message.sent")]
    MessageSent,
    #[serde(rename = "no_response.timeout")]
    NoResponseTimeout,
    #[serde(rename = "status.changed")]
    StatusChanged,
    #[serde(rename = "stage.changed")]
    StageChanged,
    #[serde(rename = "contact.created")]
    ContactCreated,
    #[serde(rename = "contact.updated")]
    ContactUpdated,
    #[serde(rename = "tag.added")]
    TagAdded,
    #[serde(rename = "tag.removed")]
    TagRemoved,
    #[serde(rename = "agent.assigned")]
    AgentAssigned,
    #[serde(rename = "purchase.completed")]
    PurchaseCompleted,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "webhook.received")]
    WebhookReceived,
    #[serde(rename = "scheduled")]
    Scheduled,
    #[serde(rename = "custom")]
    Custom,
}

impl Trigger {
    /// All triggers, in declaration order
    pub const ALL: [Trigger; 18] = [
        Trigger::SessionStarted,
        Trigger::SessionEnded,
        Trigger::SessionTimeout,
        Trigger::MessageReceived,
        Trigger::MessageSent,
        Trigger::NoResponseTimeout,
        Trigger::StatusChanged,
        Trigger::StageChanged,
        Trigger::ContactCreated,
        Trigger::ContactUpdated,
        Trigger::TagAdded,
        Trigger::TagRemoved,
        Trigger::AgentAssigned,
        Trigger::PurchaseCompleted,
        Trigger::PaymentFailed,
        Trigger::WebhookReceived,
        Trigger::Scheduled,
        Trigger::Custom,
    ];

    /// Wire name of the trigger
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::SessionStarted => "session.started",
            Trigger::SessionEnded => "session.ended",
            Trigger::SessionTimeout => "session.timeout",
            Trigger::MessageReceived => "message.received",
            Trigger::MessageSent => "message.sent",
            Trigger::NoResponseTimeout => "no_response.timeout",
            Trigger::StatusChanged => "status.changed",
            Trigger::StageChanged => "stage.changed",
            Trigger::ContactCreated => "contact.created",
            Trigger::ContactUpdated => "contact.updated",
            Trigger::TagAdded => "tag.added",
            Trigger::TagRemoved => "tag.removed",
            Trigger::AgentAssigned => "agent.assigned",
            Trigger::PurchaseCompleted => "purchase.completed",
            Trigger::PaymentFailed => "payment.failed",
            Trigger::WebhookReceived => "webhook.received",
            Trigger::Scheduled => "scheduled",
            Trigger::Custom => "custom",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Trigger::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseKindError {
                kind: "trigger",
                value: s.to_string(),
            })
    }
}

/// Classification of an automation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationType {
    /// Generic rule attached to a pipeline
    PipelineAutomation,
    FollowUp,
    Reengagement,
    Onboarding,
    Event,
    Scheduled,
    ScheduledReport,
    TimeNotification,
    Webhook,
    Custom,
}

impl AutomationType {
    pub const ALL: [AutomationType; 10] = [
        AutomationType::PipelineAutomation,
        AutomationType::FollowUp,
        AutomationType::Reengagement,
        AutomationType::Onboarding,
        AutomationType::Event,
        AutomationType::Scheduled,
        AutomationType::ScheduledReport,
        AutomationType::TimeNotification,
        AutomationType::Webhook,
        AutomationType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationType::PipelineAutomation => "pipeline_automation",
            AutomationType::FollowUp => "follow_up",
            AutomationType::Reengagement => "reengagement",
            AutomationType::Onboarding => "onboarding",
            AutomationType::Event => "event",
            AutomationType::Scheduled => "scheduled",
            AutomationType::ScheduledReport => "scheduled_report",
            AutomationType::TimeNotification => "time_notification",
            AutomationType::Webhook => "webhook",
            AutomationType::Custom => "custom",
        }
    }

    /// Whether rules of this type must be bound to a pipeline
    pub fn is_pipeline_scoped(&self) -> bool {
        matches!(
            self,
            AutomationType::PipelineAutomation
                | AutomationType::FollowUp
                | AutomationType::Reengagement
                | AutomationType::Onboarding
        )
    }
}

impl fmt::Display for AutomationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutomationType {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AutomationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseKindError {
                kind: "automation type",
                value: s.to_string(),
            })
    }
}
