//! [`PgStore`] — the Postgres implementation of the `store` traits.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use store::{
    BlockDefinitionRecord, BlockDefinitionStore, BlockDefinitionUpdate, NewBlockDefinition,
    NewBlockGroup, NewEdge, NewStep, NewTemplate, StoreError, TemplateRecord, TemplateUpdate,
    WorkflowTemplateStore,
};

use crate::repository::{block_definitions, templates};
use crate::DbPool;

/// Thin adapter from the repository functions to the store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BlockDefinitionStore for PgStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlockDefinitionRecord>, StoreError> {
        let row = block_definitions::find_by_slug(&self.pool, slug).await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, definition: NewBlockDefinition) -> Result<Uuid, StoreError> {
        let row = block_definitions::create(&self.pool, &definition).await?;
        debug!("inserted block_definitions row {} ({})", row.id, row.slug);
        Ok(row.id)
    }

    async fn update(&self, id: Uuid, fields: BlockDefinitionUpdate) -> Result<(), StoreError> {
        block_definitions::update(&self.pool, id, &fields).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowTemplateStore for PgStore {
    async fn find_template(&self, slug: &str) -> Result<Option<TemplateRecord>, StoreError> {
        let row = templates::find_by_slug(&self.pool, slug).await?;
        Ok(row.map(Into::into))
    }

    async fn create_template(&self, template: NewTemplate) -> Result<Uuid, StoreError> {
        Ok(templates::create_template(&self.pool, &template).await?)
    }

    async fn update_template(&self, id: Uuid, fields: TemplateUpdate) -> Result<(), StoreError> {
        Ok(templates::update_template(&self.pool, id, &fields).await?)
    }

    async fn clear_graph(&self, template_id: Uuid) -> Result<(), StoreError> {
        Ok(templates::clear_graph(&self.pool, template_id).await?)
    }

    async fn create_group(
        &self,
        template_id: Uuid,
        group: NewBlockGroup,
    ) -> Result<Uuid, StoreError> {
        Ok(templates::create_group(&self.pool, template_id, &group).await?)
    }

    async fn create_step(&self, template_id: Uuid, step: NewStep) -> Result<Uuid, StoreError> {
        Ok(templates::create_step(&self.pool, template_id, &step).await?)
    }

    async fn create_edge(&self, template_id: Uuid, edge: NewEdge) -> Result<Uuid, StoreError> {
        Ok(templates::create_edge(&self.pool, template_id, &edge).await?)
    }
}
