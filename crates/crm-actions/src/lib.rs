//! Action dispatch
//!
//! This crate executes the actions of automation rules. The engine only sees
//! the [`ActionExecutor`] contract; the [`ActionRegistry`] implements it by
//! routing each action to the [`ActionHandler`] registered for its type.
//!
//! # Handlers
//!
//! Built-in handlers validate their typed parameters and then call out to a
//! collaborator port:
//!
//! | Action type            | Port               |
//! |------------------------|--------------------|
//! | `send_message`         | [`MessageSender`]  |
//! | `change_status`        | [`StatusChanger`]  |
//! | `add_tag`/`remove_tag` | [`TagManager`]     |
//! | `send_webhook`         | [`WebhookSender`]  |
//! | `trigger_workflow`     | [`WorkflowTrigger`]|
//! | `assign_agent`         | [`AgentAssigner`]  |
//! | `update_contact_field` | [`ContactUpdater`] |
//!
//! [`HttpWebhookSender`] delivers webhooks over HTTP.

pub mod error;
pub mod executor;
pub mod handlers;
pub mod http;
pub mod params;
pub mod ports;
pub mod registry;

pub use error::{ActionError, ActionResult};
pub use executor::{ActionExecutor, ActionHandler};
pub use http::HttpWebhookSender;
pub use ports::{
    AgentAssigner, Collaborators, ContactUpdater, MessageSender, OutgoingMessage, StatusChanger,
    TagManager, WebhookRequest, WebhookSender, WorkflowRequest, WorkflowTrigger,
};
pub use registry::ActionRegistry;
