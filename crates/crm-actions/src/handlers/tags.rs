use std::sync::Arc;

use async_trait::async_trait;
use crm_automation::{ActionContext, ActionType, RuleAction};
use tracing::debug;

use super::require_contact;
use crate::error::ActionResult;
use crate::executor::ActionHandler;
use crate::params::{self, TagParams};
use crate::ports::TagManager;

/// Tags the contact
pub struct AddTagHandler {
    tags: Arc<dyn TagManager>,
}

impl AddTagHandler {
    pub fn new(tags: Arc<dyn TagManager>) -> Self {
        Self { tags }
    }
}

#[async_trait]
impl ActionHandler for AddTagHandler {
    fn action_type(&self) -> ActionType {
        ActionType::AddTag
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::AddTag)?;
        let params: TagParams = params::parse(action)?;
        let contact_id = require_contact(ctx, ActionType::AddTag)?;

        debug!(contact_id = %contact_id, tag = %params.tag, "Adding tag");
        self.tags.add_tag(&ctx.tenant_id, contact_id, &params.tag).await
    }
}

/// Untags the contact
pub struct RemoveTagHandler {
    tags: Arc<dyn TagManager>,
}

impl RemoveTagHandler {
    pub fn new(tags: Arc<dyn TagManager>) -> Self {
        Self { tags }
    }
}

#[async_trait]
impl ActionHandler for RemoveTagHandler {
    fn action_type(&self) -> ActionType {
        ActionType::RemoveTag
    }

    async fn execute(&self, action: &RuleAction, ctx: &ActionContext) -> ActionResult<()> {
        params::expect_type(action, ActionType::RemoveTag)?;
        let params: TagParams = params::parse(action)?;
        let contact_id = require_contact(ctx, ActionType::RemoveTag)?;

        debug!(contact_id = %contact_id, tag = %params.tag, "Removing tag");
        self.tags.remove_tag(&ctx.tenant_id, contact_id, &params.tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::mocks::RecordingTags;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_add_then_remove() {
        let tags = Arc::new(RecordingTags::default());
        let add = AddTagHandler::new(tags.clone());
        let remove = RemoveTagHandler::new(tags.clone());

        let contact = Uuid::new_v4();
        let ctx = ActionContext::new("tenant-a").with_contact(contact);

        add.execute(&RuleAction::new(ActionType::AddTag).with_param("tag", "vip"), &ctx)
            .await
            .unwrap();
        add.execute(&RuleAction::new(ActionType::AddTag).with_param("tag", "engaged"), &ctx)
            .await
            .unwrap();
        remove
            .execute(&RuleAction::new(ActionType::RemoveTag).with_param("tag", "vip"), &ctx)
            .await
            .unwrap();

        assert_eq!(tags.tags.lock().unwrap()[&contact], vec!["engaged".to_string()]);
    }

    #[tokio::test]
    async fn test_wrong_action_type() {
        let add = AddTagHandler::new(Arc::new(RecordingTags::default()));
        let ctx = ActionContext::new("tenant-a").with_contact(Uuid::new_v4());
        let action = RuleAction::new(ActionType::RemoveTag).with_param("tag", "vip");
        assert!(add.execute(&action, &ctx).await.is_err());
    }
}
