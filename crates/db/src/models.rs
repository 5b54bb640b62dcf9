//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models — they carry no domain behaviour.
//! Conversion into the `store` crate's records happens here so repository
//! callers never see raw rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// block_definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlockDefinitionRow {
    pub id: Uuid,
    pub slug: String,
    pub version: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub code: String,
    pub config_schema: Option<String>,
    pub enabled: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BlockDefinitionRow> for store::BlockDefinitionRecord {
    fn from(row: BlockDefinitionRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            version: row.version,
            name: row.name,
            description: row.description,
            category: row.category,
            subcategory: row.subcategory,
            code: row.code,
            config_schema: row.config_schema,
            enabled: row.enabled,
            parent_id: row.parent_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// workflow_templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowTemplateRow {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkflowTemplateRow> for store::TemplateRecord {
    fn from(row: WorkflowTemplateRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
