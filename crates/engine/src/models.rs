//! Core domain models.
//!
//! These types are the in-code source of truth: block definition specs that
//! the migrator pushes into the store, and workflow templates that the
//! validator checks before they are seeded. Both can be loaded from JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locale::LocalizedText;

// ---------------------------------------------------------------------------
// Block definitions
// ---------------------------------------------------------------------------

/// Top-level palette category of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Ai,
    Flow,
    Apps,
    Custom,
}

impl BlockCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Flow => "flow",
            Self::Apps => "apps",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for BlockCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finer grouping inside a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSubcategory {
    Chat,
    Rag,
    Routing,
    Branching,
    Data,
    Control,
    Utility,
    Web,
    Slack,
    Discord,
    Notion,
    Github,
    Google,
    Linear,
    Email,
}

impl BlockSubcategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Rag => "rag",
            Self::Routing => "routing",
            Self::Branching => "branching",
            Self::Data => "data",
            Self::Control => "control",
            Self::Utility => "utility",
            Self::Web => "web",
            Self::Slack => "slack",
            Self::Discord => "discord",
            Self::Notion => "notion",
            Self::Github => "github",
            Self::Google => "google",
            Self::Linear => "linear",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for BlockSubcategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative, in-code description of a block definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinitionSpec {
    /// Stable key shared with the stored record.
    pub slug: String,
    pub version: i32,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub category: BlockCategory,
    #[serde(default)]
    pub subcategory: Option<BlockSubcategory>,
    /// Script body executed by the runtime.
    #[serde(default)]
    pub code: String,
    /// JSON schema text per locale; an empty variant means "no schema".
    #[serde(default)]
    pub config_schema: LocalizedText,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Slug of the definition this one inherits from.
    #[serde(default)]
    pub parent_slug: Option<String>,
}

fn default_enabled() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Workflow templates
// ---------------------------------------------------------------------------

/// Step type that marks the entry point of a template.
pub const START_STEP_TYPE: &str = "start";

/// Editor canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A single step in the template graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Caller-assigned id, unique within the template.
    pub temp_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
    /// Group this step is contained in.
    #[serde(default)]
    pub block_group_temp_id: Option<String>,
    #[serde(default)]
    pub trigger_type: Option<String>,
    #[serde(default)]
    pub trigger_config: Option<serde_json::Value>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl Step {
    pub fn is_start(&self) -> bool {
        self.step_type == START_STEP_TYPE
    }
}

/// Control-flow container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockGroupType {
    Parallel,
    TryCatch,
    Foreach,
    While,
}

impl BlockGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::TryCatch => "try_catch",
            Self::Foreach => "foreach",
            Self::While => "while",
        }
    }
}

/// A control-flow group wrapping a subset of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockGroup {
    /// Caller-assigned id; shares no values with step temp ids.
    pub temp_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: BlockGroupType,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// One end of an edge: a step or a group, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeEndpoint {
    StepRef(String),
    GroupRef(String),
}

impl EdgeEndpoint {
    pub fn temp_id(&self) -> &str {
        match self {
            Self::StepRef(id) | Self::GroupRef(id) => id,
        }
    }
}

/// Directed edge between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EdgeWire", into = "EdgeWire")]
pub struct Edge {
    pub source: EdgeEndpoint,
    pub target: EdgeEndpoint,
    pub source_port: String,
    pub target_port: String,
}

impl Edge {
    pub fn new(source: EdgeEndpoint, target: EdgeEndpoint) -> Self {
        Self {
            source,
            target,
            source_port: "output".into(),
            target_port: "input".into(),
        }
    }
}

/// JSON shape of an edge: a pair of optional ids per side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_temp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_group_temp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_temp_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_group_temp_id: Option<String>,
    #[serde(default = "default_source_port")]
    source_port: String,
    #[serde(default = "default_target_port")]
    target_port: String,
}

fn default_source_port() -> String {
    "output".into()
}

fn default_target_port() -> String {
    "input".into()
}

fn endpoint_from_pair(
    side: &str,
    step: Option<String>,
    group: Option<String>,
) -> Result<EdgeEndpoint, String> {
    let step = step.filter(|s| !s.is_empty());
    let group = group.filter(|g| !g.is_empty());
    match (step, group) {
        (Some(step), None) => Ok(EdgeEndpoint::StepRef(step)),
        (None, Some(group)) => Ok(EdgeEndpoint::GroupRef(group)),
        (Some(_), Some(_)) => Err(format!(
            "edge {side} sets both {side}_temp_id and {side}_group_temp_id"
        )),
        (None, None) => Err(format!(
            "edge {side} requires {side}_temp_id or {side}_group_temp_id"
        )),
    }
}

impl TryFrom<EdgeWire> for Edge {
    type Error = String;

    fn try_from(wire: EdgeWire) -> Result<Self, Self::Error> {
        Ok(Self {
            source: endpoint_from_pair("source", wire.source_temp_id, wire.source_group_temp_id)?,
            target: endpoint_from_pair("target", wire.target_temp_id, wire.target_group_temp_id)?,
            source_port: wire.source_port,
            target_port: wire.target_port,
        })
    }
}

impl From<Edge> for EdgeWire {
    fn from(edge: Edge) -> Self {
        let mut wire = EdgeWire {
            source_port: edge.source_port,
            target_port: edge.target_port,
            ..Default::default()
        };
        match edge.source {
            EdgeEndpoint::StepRef(id) => wire.source_temp_id = Some(id),
            EdgeEndpoint::GroupRef(id) => wire.source_group_temp_id = Some(id),
        }
        match edge.target {
            EdgeEndpoint::StepRef(id) => wire.target_temp_id = Some(id),
            EdgeEndpoint::GroupRef(id) => wire.target_group_temp_id = Some(id),
        }
        wire
    }
}

/// A reusable workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: i32,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub block_groups: Vec<BlockGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn edge_parses_step_and_group_endpoints() {
        let edge: Edge = serde_json::from_value(json!({
            "source_temp_id": "start",
            "target_group_temp_id": "fan-out",
        }))
        .expect("valid edge");

        assert_eq!(edge.source, EdgeEndpoint::StepRef("start".into()));
        assert_eq!(edge.target, EdgeEndpoint::GroupRef("fan-out".into()));
        assert_eq!(edge.source_port, "output");
        assert_eq!(edge.target_port, "input");
    }

    #[test]
    fn edge_with_both_source_ids_is_rejected() {
        let result = serde_json::from_value::<Edge>(json!({
            "source_temp_id": "a",
            "source_group_temp_id": "g",
            "target_temp_id": "b",
        }));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("sets both"), "{err}");
    }

    #[test]
    fn edge_without_target_is_rejected() {
        let result = serde_json::from_value::<Edge>(json!({ "source_temp_id": "a" }));
        assert!(result.is_err());
    }

    #[test]
    fn edge_serializes_back_to_wire_shape() {
        let edge = Edge::new(
            EdgeEndpoint::GroupRef("loop".into()),
            EdgeEndpoint::StepRef("done".into()),
        );
        let value = serde_json::to_value(&edge).unwrap();
        assert_eq!(value["source_group_temp_id"], "loop");
        assert_eq!(value["target_temp_id"], "done");
        assert!(value.get("source_temp_id").is_none());
    }

    #[test]
    fn spec_defaults_enabled_and_optional_fields() {
        let spec: BlockDefinitionSpec = serde_json::from_value(json!({
            "slug": "http",
            "version": 1,
            "name": { "en": "HTTP" },
            "category": "apps",
        }))
        .unwrap();
        assert!(spec.enabled);
        assert_eq!(spec.parent_slug, None);
        assert_eq!(spec.subcategory, None);
        assert!(spec.config_schema.en.is_empty());
    }
}
