//! Accumulate-then-drain event buffering

use tracing::trace;

use crate::event::{DomainEvent, EventData};

/// Pending domain events of one aggregate
///
/// Aggregates record events as their state changes. The caller persists the
/// aggregate and then drains the buffer to publish what happened; events are
/// never published from inside the aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBuffer {
    pending: Vec<DomainEvent>,
}

impl EventBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a typed event
    pub fn record<T: EventData>(&mut self, data: &T, aggregate_id: &str, tenant_id: &str) {
        let event = DomainEvent::typed(data, aggregate_id, tenant_id);
        trace!(event_type = %event.event_type, aggregate_id, "Recorded domain event");
        self.pending.push(event);
    }

    /// Events recorded since the last drain, oldest first
    pub fn pending(&self) -> &[DomainEvent] {
        &self.pending
    }

    /// Return all pending events and clear the buffer
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
