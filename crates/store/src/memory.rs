//! `InMemoryStore` — a store backed by plain vectors.
//!
//! Used by the engine's tests and by dry runs where no database is at hand.
//! Every write is recorded so tests can assert on ordering, and writes for a
//! given slug can be made to fail.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    BlockDefinitionRecord, BlockDefinitionUpdate, NewBlockDefinition, NewBlockGroup, NewEdge,
    NewStep, NewTemplate, TemplateRecord, TemplateUpdate,
};
use crate::{BlockDefinitionStore, StoreError, WorkflowTemplateStore};

/// A single mutating call observed by the store, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    CreateDefinition { slug: String },
    UpdateDefinition { slug: String },
    CreateTemplate { slug: String },
    UpdateTemplate { slug: String },
    ClearGraph { template_id: Uuid },
    CreateGroup { template_id: Uuid },
    CreateStep { template_id: Uuid },
    CreateEdge { template_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct StoredGroup {
    pub id: Uuid,
    pub template_id: Uuid,
    pub group: NewBlockGroup,
}

#[derive(Debug, Clone)]
pub struct StoredStep {
    pub id: Uuid,
    pub template_id: Uuid,
    pub step: NewStep,
}

#[derive(Debug, Clone)]
pub struct StoredEdge {
    pub id: Uuid,
    pub template_id: Uuid,
    pub edge: NewEdge,
}

#[derive(Debug, Default)]
struct State {
    definitions: Vec<BlockDefinitionRecord>,
    templates: Vec<TemplateRecord>,
    groups: Vec<StoredGroup>,
    steps: Vec<StoredStep>,
    edges: Vec<StoredEdge>,
    writes: Vec<StoreWrite>,
    failing_slugs: HashSet<String>,
    failing_edges: usize,
}

/// Thread-safe in-memory implementation of both store traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure for '{0}'")]
struct InjectedFailure(String);

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with block definition records.
    pub fn with_definitions(records: Vec<BlockDefinitionRecord>) -> Self {
        let store = Self::default();
        store.lock().definitions = records;
        store
    }

    /// Make every create/update touching `slug` fail with a backend error.
    pub fn fail_writes_for(&self, slug: impl Into<String>) {
        self.lock().failing_slugs.insert(slug.into());
    }

    /// Make the next `count` edge inserts fail, then behave normally again.
    pub fn fail_next_edges(&self, count: usize) {
        self.lock().failing_edges = count;
    }

    /// Current copy of the stored definition with this slug.
    pub fn definition(&self, slug: &str) -> Option<BlockDefinitionRecord> {
        self.lock().definitions.iter().find(|d| d.slug == slug).cloned()
    }

    pub fn definitions(&self) -> Vec<BlockDefinitionRecord> {
        self.lock().definitions.clone()
    }

    pub fn template(&self, slug: &str) -> Option<TemplateRecord> {
        self.lock().templates.iter().find(|t| t.slug == slug).cloned()
    }

    pub fn groups(&self, template_id: Uuid) -> Vec<StoredGroup> {
        self.lock()
            .groups
            .iter()
            .filter(|g| g.template_id == template_id)
            .cloned()
            .collect()
    }

    pub fn steps(&self, template_id: Uuid) -> Vec<StoredStep> {
        self.lock()
            .steps
            .iter()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect()
    }

    pub fn edges(&self, template_id: Uuid) -> Vec<StoredEdge> {
        self.lock()
            .edges
            .iter()
            .filter(|e| e.template_id == template_id)
            .cloned()
            .collect()
    }

    /// All writes seen so far, oldest first.
    pub fn writes(&self) -> Vec<StoreWrite> {
        self.lock().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not wedge the rest of the suite.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn check_failure(&self, slug: &str) -> Result<(), StoreError> {
        if self.failing_slugs.contains(slug) {
            return Err(StoreError::backend(InjectedFailure(slug.to_owned())));
        }
        Ok(())
    }
}

#[async_trait]
impl BlockDefinitionStore for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlockDefinitionRecord>, StoreError> {
        Ok(self.definition(slug))
    }

    async fn create(&self, definition: NewBlockDefinition) -> Result<Uuid, StoreError> {
        let mut state = self.lock();
        state.check_failure(&definition.slug)?;

        if state.definitions.iter().any(|d| d.slug == definition.slug) {
            return Err(StoreError::Conflict(format!(
                "block definition '{}' already exists",
                definition.slug
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        state.writes.push(StoreWrite::CreateDefinition {
            slug: definition.slug.clone(),
        });
        state.definitions.push(BlockDefinitionRecord {
            id,
            slug: definition.slug,
            version: definition.version,
            name: definition.name,
            description: definition.description,
            category: definition.category,
            subcategory: definition.subcategory,
            code: definition.code,
            config_schema: definition.config_schema,
            enabled: definition.enabled,
            parent_id: definition.parent_id,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update(&self, id: Uuid, fields: BlockDefinitionUpdate) -> Result<(), StoreError> {
        let mut state = self.lock();
        let slug = state
            .definitions
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.slug.clone())
            .ok_or(StoreError::NotFound)?;
        state.check_failure(&slug)?;

        state.writes.push(StoreWrite::UpdateDefinition { slug });
        if let Some(record) = state.definitions.iter_mut().find(|d| d.id == id) {
            record.version = fields.version;
            record.name = fields.name;
            record.description = fields.description;
            record.category = fields.category;
            record.subcategory = fields.subcategory;
            record.code = fields.code;
            record.config_schema = fields.config_schema;
            record.parent_id = fields.parent_id;
            record.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl WorkflowTemplateStore for InMemoryStore {
    async fn find_template(&self, slug: &str) -> Result<Option<TemplateRecord>, StoreError> {
        Ok(self.template(slug))
    }

    async fn create_template(&self, template: NewTemplate) -> Result<Uuid, StoreError> {
        let mut state = self.lock();
        state.check_failure(&template.slug)?;

        if state.templates.iter().any(|t| t.slug == template.slug) {
            return Err(StoreError::Conflict(format!(
                "workflow template '{}' already exists",
                template.slug
            )));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        state.writes.push(StoreWrite::CreateTemplate {
            slug: template.slug.clone(),
        });
        state.templates.push(TemplateRecord {
            id,
            slug: template.slug,
            name: template.name,
            description: template.description,
            version: template.version,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_template(&self, id: Uuid, fields: TemplateUpdate) -> Result<(), StoreError> {
        let mut state = self.lock();
        let slug = state
            .templates
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.slug.clone())
            .ok_or(StoreError::NotFound)?;
        state.check_failure(&slug)?;

        state.writes.push(StoreWrite::UpdateTemplate { slug });
        if let Some(record) = state.templates.iter_mut().find(|t| t.id == id) {
            record.name = fields.name;
            record.description = fields.description;
            record.version = fields.version;
            record.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn clear_graph(&self, template_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes.push(StoreWrite::ClearGraph { template_id });
        state.edges.retain(|e| e.template_id != template_id);
        state.steps.retain(|s| s.template_id != template_id);
        state.groups.retain(|g| g.template_id != template_id);
        Ok(())
    }

    async fn create_group(
        &self,
        template_id: Uuid,
        group: NewBlockGroup,
    ) -> Result<Uuid, StoreError> {
        let mut state = self.lock();
        let id = Uuid::new_v4();
        state.writes.push(StoreWrite::CreateGroup { template_id });
        state.groups.push(StoredGroup { id, template_id, group });
        Ok(id)
    }

    async fn create_step(&self, template_id: Uuid, step: NewStep) -> Result<Uuid, StoreError> {
        let mut state = self.lock();
        let id = Uuid::new_v4();
        state.writes.push(StoreWrite::CreateStep { template_id });
        state.steps.push(StoredStep { id, template_id, step });
        Ok(id)
    }

    async fn create_edge(&self, template_id: Uuid, edge: NewEdge) -> Result<Uuid, StoreError> {
        let mut state = self.lock();
        if state.failing_edges > 0 {
            state.failing_edges -= 1;
            return Err(StoreError::backend(InjectedFailure(format!("edge of {template_id}"))));
        }
        let id = Uuid::new_v4();
        state.writes.push(StoreWrite::CreateEdge { template_id });
        state.edges.push(StoredEdge { id, template_id, edge });
        Ok(id)
    }
}
