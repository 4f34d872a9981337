//! Action handler registry
//!
//! Maps each action type to at most one handler. Registering a second
//! handler for a type replaces the first.

use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use dashmap::DashMap;
use tracing::{debug, instrument, warn};

use crate::error::{ActionError, ActionResult};
use crate::executor::{ActionExecutor, ActionHandler};
use crate::handlers::{
    AddTagHandler, AssignAgentHandler, ChangeStatusHandler, RemoveTagHandler,
    SendMessageHandler, SendWebhookHandler, TriggerWorkflowHandler, UpdateContactFieldHandler,
};
use crate::ports::Collaborators;

/// Registry of action handlers, dispatching by action type
#[derive(Default)]
pub struct ActionRegistry {
    handlers: DashMap<ActionType, Arc<dyn ActionHandler>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in handlers for `collaborators`
    pub fn with_builtin(collaborators: &Collaborators) -> Self {
        let registry = Self::new();
        registry.register_builtin(collaborators);
        registry
    }

    /// Register a handler for its action type
    pub fn register(&self, handler: Arc<dyn ActionHandler>) {
        let action_type = handler.action_type();
        debug!(action_type = %action_type, "Registering action handler");
        if self.handlers.insert(action_type, handler).is_some() {
            warn!(action_type = %action_type, "Replaced existing action handler");
        }
    }

    /// Register the built-in handler of every collaborator present
    ///
    /// Returns the number of handlers registered.
    pub fn register_builtin(&self, collaborators: &Collaborators) -> usize {
        let before = self.handlers.len();

        if let Some(sender) = &collaborators.messages {
            self.register(Arc::new(SendMessageHandler::new(sender.clone())));
        }
        if let Some(changer) = &collaborators.statuses {
            self.register(Arc::new(ChangeStatusHandler::new(changer.clone())));
        }
        if let Some(tags) = &collaborators.tags {
            self.register(Arc::new(AddTagHandler::new(tags.clone())));
            self.register(Arc::new(RemoveTagHandler::new(tags.clone())));
        }
        if let Some(sender) = &collaborators.webhooks {
            self.register(Arc::new(SendWebhookHandler::new(sender.clone())));
        }
        if let Some(trigger) = &collaborators.workflows {
            self.register(Arc::new(TriggerWorkflowHandler::new(trigger.clone())));
        }
        if let Some(assigner) = &collaborators.agents {
            self.register(Arc::new(AssignAgentHandler::new(assigner.clone())));
        }
        if let Some(updater) = &collaborators.contacts {
            self.register(Arc::new(UpdateContactFieldHandler::new(updater.clone())));
        }

        self.handlers.len().saturating_sub(before)
    }

    /// Handler registered for `action_type`
    pub fn get(&self, action_type: ActionType) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&action_type).map(|entry| entry.value().clone())
    }

    pub fn has(&self, action_type: ActionType) -> bool {
        self.handlers.contains_key(&action_type)
    }

    /// Remove the handler for `action_type`
    pub fn unregister(&self, action_type: ActionType) -> bool {
        let removed = self.handlers.remove(&action_type).is_some();
        if removed {
            debug!(action_type = %action_type, "Unregistered action handler");
        }
        removed
    }

    /// Registered action types, in declaration order
    pub fn action_types(&self) -> Vec<ActionType> {
        ActionType::ALL
            .iter()
            .copied()
            .filter(|t| self.handlers.contains_key(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl ActionExecutor for ActionRegistry {
    #[instrument(skip_all, fields(action_type = %action.action_type, rule_id = ?ctx.rule_id))]
    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        // Clone the handler out so the map shard is not held across the await
        let handler = self.get(action.action_type).ok_or_else(|| {
            warn!("No handler for action type");
            ActionError::UnknownActionType(action.action_type)
        })?;

        debug!("Executing action");
        handler.execute(action, ctx).await
    }
}
