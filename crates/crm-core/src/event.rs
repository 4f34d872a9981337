//! Domain event envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ulid::Ulid;

/// Trait for typed event payloads
///
/// Implement this trait for any payload an aggregate records. The static
/// event type is what subscribers and outbox relays route on.
pub trait EventData: Serialize + Clone + Send + Sync + 'static {
    /// The event type string for this payload (e.g. `automation.created`)
    fn event_type() -> &'static str;
}

/// An event recorded by an aggregate
///
/// The payload is kept as JSON so heterogeneous events can share one buffer
/// and one outbox table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique identifier for this event (ULID, sortable by creation time)
    pub event_id: String,

    /// The type of event
    pub event_type: String,

    /// Identity of the aggregate that recorded the event
    pub aggregate_id: String,

    /// Tenant partition the aggregate belongs to
    pub tenant_id: String,

    /// When the event was recorded
    pub occurred_at: DateTime<Utc>,

    /// Event payload
    pub payload: serde_json::Value,
}

impl DomainEvent {
    /// Create an event with an explicit type and raw payload
    pub fn new(
        event_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        tenant_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            event_type: event_type.into(),
            aggregate_id: aggregate_id.into(),
            tenant_id: tenant_id.into(),
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Create an event from a typed payload
    ///
    /// A payload that fails to serialize is recorded as `null` and logged.
    pub fn typed<T: EventData>(
        data: &T,
        aggregate_id: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let aggregate_id = aggregate_id.into();
        let payload = serde_json::to_value(data).unwrap_or_else(|e| {
            warn!(
                event_type = T::event_type(),
                aggregate_id = %aggregate_id,
                error = %e,
                "Failed to serialize event payload, recording null"
            );
            serde_json::Value::Null
        });
        Self::new(T::event_type(), aggregate_id, tenant_id, payload)
    }

    /// Check whether this event carries the given payload type
    pub fn is<T: EventData>(&self) -> bool {
        self.event_type == T::event_type()
    }
}
