//! The in-code set of block definition specs.
//!
//! A registry guarantees slug uniqueness at registration time; ordering by
//! inheritance is left to the migrator, so specs may be registered in any
//! order.

use std::collections::HashMap;

use serde_json::json;
use tracing::error;

use crate::error::EngineError;
use crate::locale::LocalizedText;
use crate::models::{BlockCategory, BlockDefinitionSpec, BlockSubcategory};

#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    specs: Vec<BlockDefinitionSpec>,
    by_slug: HashMap<String, usize>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a spec; a slug may only be registered once.
    pub fn register(&mut self, spec: BlockDefinitionSpec) -> Result<(), EngineError> {
        if self.by_slug.contains_key(&spec.slug) {
            return Err(EngineError::DuplicateSlug(spec.slug));
        }
        self.by_slug.insert(spec.slug.clone(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    /// Build a registry from a JSON array of specs.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let specs: Vec<BlockDefinitionSpec> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    pub fn get(&self, slug: &str) -> Option<&BlockDefinitionSpec> {
        self.by_slug.get(slug).map(|&i| &self.specs[i])
    }

    /// Specs in registration order.
    pub fn specs(&self) -> &[BlockDefinitionSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The block definitions shipped with the engine.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for spec in builtin_specs() {
            if let Err(err) = registry.register(spec) {
                error!("built-in block definition skipped: {err}");
            }
        }
        registry
    }
}

fn schema(value: serde_json::Value) -> LocalizedText {
    LocalizedText::uniform(value.to_string())
}

fn builtin_specs() -> Vec<BlockDefinitionSpec> {
    vec![
        BlockDefinitionSpec {
            slug: "start".into(),
            version: 1,
            name: LocalizedText::new("Start", "開始"),
            description: LocalizedText::new("Entry point of a workflow", "ワークフローの開始点"),
            category: BlockCategory::Flow,
            subcategory: Some(BlockSubcategory::Control),
            code: "return input;".into(),
            config_schema: LocalizedText::default(),
            enabled: true,
            parent_slug: None,
        },
        BlockDefinitionSpec {
            slug: "llm".into(),
            version: 1,
            name: LocalizedText::new("LLM", "LLM"),
            description: LocalizedText::new("Generate text with a language model", "言語モデルでテキストを生成"),
            category: BlockCategory::Ai,
            subcategory: Some(BlockSubcategory::Chat),
            code: "return ctx.llm.chat({ model: config.model, messages: [{ role: 'user', content: renderTemplate(config.prompt, input) }] });".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["model", "prompt"],
                "properties": {
                    "model": { "type": "string" },
                    "prompt": { "type": "string" },
                    "temperature": { "type": "number", "minimum": 0, "maximum": 2 }
                }
            })),
            enabled: true,
            parent_slug: None,
        },
        BlockDefinitionSpec {
            slug: "condition".into(),
            version: 1,
            name: LocalizedText::new("Condition", "条件分岐"),
            description: LocalizedText::new("Route to the true or false port", "true/false ポートへ分岐"),
            category: BlockCategory::Flow,
            subcategory: Some(BlockSubcategory::Branching),
            code: "return { __branch: evaluate(config.expression, input) ? 'true' : 'false', data: input };".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["expression"],
                "properties": { "expression": { "type": "string" } }
            })),
            enabled: true,
            parent_slug: None,
        },
        BlockDefinitionSpec {
            slug: "http".into(),
            version: 1,
            name: LocalizedText::new("HTTP Request", "HTTPリクエスト"),
            description: LocalizedText::new("Send an HTTP request", "HTTPリクエストを送信"),
            category: BlockCategory::Apps,
            subcategory: Some(BlockSubcategory::Web),
            code: "return ctx.http.request({ method: config.method, url: config.url, headers: config.headers, body: config.body });".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["url"],
                "properties": {
                    "method": { "type": "string", "enum": ["GET", "POST", "PUT", "PATCH", "DELETE"] },
                    "url": { "type": "string" },
                    "headers": { "type": "object" }
                }
            })),
            enabled: true,
            parent_slug: None,
        },
        BlockDefinitionSpec {
            slug: "rest-api".into(),
            version: 1,
            name: LocalizedText::new("REST API", "REST API"),
            description: LocalizedText::new("JSON request against a base URL", "ベースURLへのJSONリクエスト"),
            category: BlockCategory::Apps,
            subcategory: Some(BlockSubcategory::Web),
            code: "config.url = config.base_url + config.path; config.headers = { 'Content-Type': 'application/json', ...config.headers }; return parent(input, config);".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["base_url"],
                "properties": {
                    "base_url": { "type": "string" },
                    "path": { "type": "string" }
                }
            })),
            enabled: true,
            parent_slug: Some("http".into()),
        },
        BlockDefinitionSpec {
            slug: "bearer-api".into(),
            version: 1,
            name: LocalizedText::new("Bearer Token API", "Bearerトークン API"),
            description: LocalizedText::new("REST API authenticated with a bearer token", "Bearerトークン認証のREST API"),
            category: BlockCategory::Apps,
            subcategory: Some(BlockSubcategory::Web),
            code: "config.headers = { Authorization: 'Bearer ' + ctx.secrets[config.secret_key], ...config.headers }; return parent(input, config);".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["secret_key"],
                "properties": { "secret_key": { "type": "string" } }
            })),
            enabled: true,
            parent_slug: Some("rest-api".into()),
        },
        BlockDefinitionSpec {
            slug: "github-api".into(),
            version: 1,
            name: LocalizedText::new("GitHub API", "GitHub API"),
            description: LocalizedText::new("Call the GitHub REST API", "GitHub REST APIを呼び出す"),
            category: BlockCategory::Apps,
            subcategory: Some(BlockSubcategory::Github),
            code: "config.base_url = 'https://api.github.com'; config.secret_key = config.secret_key || 'GITHUB_TOKEN'; return parent(input, config);".into(),
            config_schema: LocalizedText::default(),
            enabled: true,
            parent_slug: Some("bearer-api".into()),
        },
        BlockDefinitionSpec {
            slug: "github_create_issue".into(),
            version: 1,
            name: LocalizedText::new("GitHub: Create Issue", "GitHub: Issue作成"),
            description: LocalizedText::new("Open an issue in a repository", "リポジトリにIssueを作成"),
            category: BlockCategory::Apps,
            subcategory: Some(BlockSubcategory::Github),
            code: "config.method = 'POST'; config.path = '/repos/' + config.owner + '/' + config.repo + '/issues'; config.body = { title: input.title, body: input.body }; return parent(input, config);".into(),
            config_schema: schema(json!({
                "type": "object",
                "required": ["owner", "repo"],
                "properties": {
                    "owner": { "type": "string" },
                    "repo": { "type": "string" }
                }
            })),
            enabled: true,
            parent_slug: Some("github-api".into()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::sort_by_inheritance;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_catalogue_orders_the_github_chain() {
        let registry = DefinitionRegistry::builtin();
        let sorted = sort_by_inheritance(registry.specs()).expect("builtin catalogue is a forest");

        let chain: Vec<&str> = sorted
            .iter()
            .map(|s| s.slug.as_str())
            .filter(|s| ["http", "rest-api", "bearer-api", "github-api", "github_create_issue"].contains(s))
            .collect();
        assert_eq!(
            chain,
            vec!["http", "rest-api", "bearer-api", "github-api", "github_create_issue"]
        );
        assert_eq!(sorted.len(), registry.len());
    }

    #[test]
    fn builtin_schemas_are_valid_json() {
        for spec in DefinitionRegistry::builtin().specs() {
            for text in [&spec.config_schema.en, &spec.config_schema.ja] {
                if !text.is_empty() {
                    assert!(
                        serde_json::from_str::<serde_json::Value>(text).is_ok(),
                        "{}",
                        spec.slug
                    );
                }
            }
        }
    }

    #[test]
    fn builtin_catalogue_keeps_every_spec() {
        assert_eq!(DefinitionRegistry::builtin().len(), builtin_specs().len());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = DefinitionRegistry::builtin();
        let http = registry.get("http").cloned().expect("builtin http");
        assert!(matches!(
            registry.register(http),
            Err(EngineError::DuplicateSlug(slug)) if slug == "http"
        ));
    }

    #[test]
    fn loads_specs_from_json() {
        let registry = DefinitionRegistry::from_json(
            r#"[
                { "slug": "http", "version": 2, "name": { "en": "HTTP" }, "category": "apps", "subcategory": "web" },
                { "slug": "webhook", "version": 1, "name": { "en": "Webhook" }, "category": "apps", "parent_slug": "http" }
            ]"#,
        )
        .expect("valid json");

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("webhook").and_then(|s| s.parent_slug.as_deref()), Some("http"));
        assert_eq!(registry.get("http").map(|s| s.subcategory), Some(Some(BlockSubcategory::Web)));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            DefinitionRegistry::from_json("[{"),
            Err(EngineError::InvalidDefinitions(_))
        ));
    }
}
