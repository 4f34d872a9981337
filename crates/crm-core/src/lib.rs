//! Core types for the CRM automation engine
//!
//! This crate provides the domain-event envelope shared by every aggregate
//! in the workspace, together with the buffer aggregates use to accumulate
//! events until the caller has persisted them.

mod buffer;
mod event;

pub use buffer::EventBuffer;
pub use event::{DomainEvent, EventData};
