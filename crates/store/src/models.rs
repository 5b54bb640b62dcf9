//! Persisted shapes exchanged with a store.
//!
//! These are *persistence* models: every localized field has already been
//! resolved to a single string and every reference is a store-assigned id.
//! Domain types (specs, templates) live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// block definitions
// ---------------------------------------------------------------------------

/// A block definition as it exists in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinitionRecord {
    pub id: Uuid,
    pub slug: String,
    pub version: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub code: String,
    /// JSON schema text, stored verbatim.
    pub config_schema: Option<String>,
    pub enabled: bool,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a block definition that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlockDefinition {
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
}

/// Replacement values written over an existing block definition.
///
/// `enabled` is deliberately absent: it is toggled by operators and a
/// migration must not flip it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinitionUpdate {
    pub version: i32,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub code: String,
    pub config_schema: Option<String>,
    pub parent_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// workflow templates
// ---------------------------------------------------------------------------

/// Header row of a stored workflow template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub name: String,
    pub description: String,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlockGroup {
    pub name: String,
    /// One of `parallel`, `try_catch`, `foreach`, `while`.
    pub group_type: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStep {
    pub name: String,
    pub step_type: String,
    pub config: serde_json::Value,
    /// Stored id of the containing block group.
    pub block_group_id: Option<Uuid>,
    pub trigger_type: Option<String>,
    pub trigger_config: Option<serde_json::Value>,
    pub position: Option<(f64, f64)>,
}

/// A stored edge endpoint: either a step row or a block group row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EndpointId {
    Step(Uuid),
    Group(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEdge {
    pub source: EndpointId,
    pub target: EndpointId,
    pub source_port: String,
    pub target_port: String,
}
