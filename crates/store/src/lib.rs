//! `store` crate — the persistence contract for block definitions and
//! workflow templates, plus an in-memory implementation.
//!
//! The engine crate drives migrations and template seeding exclusively
//! through [`BlockDefinitionStore`] and [`WorkflowTemplateStore`]; the `db`
//! crate provides the Postgres implementation.

pub mod error;
pub mod models;
pub mod traits;
pub mod memory;

pub use error::StoreError;
pub use memory::InMemoryStore;
pub use models::{
    BlockDefinitionRecord, BlockDefinitionUpdate, EndpointId, NewBlockDefinition, NewBlockGroup,
    NewEdge, NewStep, NewTemplate, TemplateRecord, TemplateUpdate,
};
pub use traits::{BlockDefinitionStore, WorkflowTemplateStore};
