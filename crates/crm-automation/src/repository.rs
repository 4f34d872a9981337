//! Automation persistence contract
//!
//! The engine only reads through [`AutomationRepository::find_by_pipeline_and_trigger`];
//! rule CRUD writes through `save`/`delete`. Listing methods return rules in
//! evaluation order (ascending priority).

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::automation::{Automation, AutomationSnapshot};
use crate::trigger::Trigger;

/// Repository errors
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("automation not found: {0}")]
    NotFound(Uuid),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound(_))
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage of automation rules
#[async_trait]
pub trait AutomationRepository: Send + Sync {
    /// Insert or replace a rule
    async fn save(&self, automation: &Automation) -> RepositoryResult<()>;

    /// Load a rule by id
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Automation>;

    /// All rules of a pipeline
    async fn find_by_pipeline(&self, pipeline_id: Uuid) -> RepositoryResult<Vec<Automation>>;

    /// Rules of a pipeline listening to a trigger, enabled or not
    async fn find_by_pipeline_and_trigger(
        &self,
        pipeline_id: Uuid,
        trigger: Trigger,
    ) -> RepositoryResult<Vec<Automation>>;

    /// Enabled rules of a pipeline
    async fn find_enabled_by_pipeline(&self, pipeline_id: Uuid)
        -> RepositoryResult<Vec<Automation>>;

    /// Remove a rule
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;
}

/// In-memory repository
///
/// Stores snapshots, so pending domain events never leak into storage.
#[derive(Default)]
pub struct InMemoryAutomationRepository {
    automations: DashMap<Uuid, AutomationSnapshot>,
}

impl InMemoryAutomationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.automations.len()
    }

    fn collect(&self, filter: impl Fn(&AutomationSnapshot) -> bool) -> Vec<Automation> {
        let mut snapshots: Vec<AutomationSnapshot> = self
            .automations
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        snapshots.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        snapshots.into_iter().map(Automation::reconstruct).collect()
    }
}

#[async_trait]
impl AutomationRepository for InMemoryAutomationRepository {
    async fn save(&self, automation: &Automation) -> RepositoryResult<()> {
        let snapshot = automation.snapshot();
        debug!(automation_id = %snapshot.id, name = %snapshot.name, "Saving automation");
        self.automations.insert(snapshot.id, snapshot);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Automation> {
        self.automations
            .get(&id)
            .map(|entry| Automation::reconstruct(entry.value().clone()))
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn find_by_pipeline(&self, pipeline_id: Uuid) -> RepositoryResult<Vec<Automation>> {
        Ok(self.collect(|a| a.pipeline_id == Some(pipeline_id)))
    }

    async fn find_by_pipeline_and_trigger(
        &self,
        pipeline_id: Uuid,
        trigger: Trigger,
    ) -> RepositoryResult<Vec<Automation>> {
        Ok(self.collect(|a| a.pipeline_id == Some(pipeline_id) && a.trigger == trigger))
    }

    async fn find_enabled_by_pipeline(
        &self,
        pipeline_id: Uuid,
    ) -> RepositoryResult<Vec<Automation>> {
        Ok(self.collect(|a| a.pipeline_id == Some(pipeline_id) && a.enabled))
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let (_, removed) = self
            .automations
            .remove(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        info!(automation_id = %id, name = %removed.name, "Deleted automation");
        Ok(())
    }
}
