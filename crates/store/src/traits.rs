//! The store traits — the contract every persistence backend must fulfil.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    BlockDefinitionRecord, BlockDefinitionUpdate, NewBlockDefinition, NewBlockGroup, NewEdge,
    NewStep, NewTemplate, TemplateRecord, TemplateUpdate,
};
use crate::StoreError;

/// Persistence of block definitions, keyed by slug.
///
/// Each call commits on its own; callers that need ordering (the migrator
/// does) must await calls one after another.
#[async_trait]
pub trait BlockDefinitionStore: Send + Sync {
    /// Fetch the stored definition with this slug, if any.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlockDefinitionRecord>, StoreError>;

    /// Insert a new definition and return its assigned id.
    async fn create(&self, definition: NewBlockDefinition) -> Result<Uuid, StoreError>;

    /// Overwrite the migrated fields of an existing definition.
    async fn update(&self, id: Uuid, fields: BlockDefinitionUpdate) -> Result<(), StoreError>;
}

/// Persistence of workflow templates and their graphs.
#[async_trait]
pub trait WorkflowTemplateStore: Send + Sync {
    async fn find_template(&self, slug: &str) -> Result<Option<TemplateRecord>, StoreError>;

    async fn create_template(&self, template: NewTemplate) -> Result<Uuid, StoreError>;

    async fn update_template(&self, id: Uuid, fields: TemplateUpdate) -> Result<(), StoreError>;

    /// Delete every step, edge and group belonging to the template.
    async fn clear_graph(&self, template_id: Uuid) -> Result<(), StoreError>;

    async fn create_group(&self, template_id: Uuid, group: NewBlockGroup)
        -> Result<Uuid, StoreError>;

    async fn create_step(&self, template_id: Uuid, step: NewStep) -> Result<Uuid, StoreError>;

    async fn create_edge(&self, template_id: Uuid, edge: NewEdge) -> Result<Uuid, StoreError>;
}
