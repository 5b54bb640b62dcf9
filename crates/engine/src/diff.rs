//! Change detection between a stored block definition and its spec.
//!
//! A `BlockDefinitionSpec` is first resolved against a locale into a [`ResolvedDefinition`];
//! from then on every comparison works on plain strings. All public helpers
//! derive from [`compare`], so `has_changes` and `describe_changes` can never
//! disagree about which fields differ.

use std::fmt;

use store::BlockDefinitionRecord;

use crate::locale::{resolve, Locale};
use crate::models::BlockDefinitionSpec;

/// A spec with every localized field reduced to one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDefinition<'a> {
    pub slug: &'a str,
    pub version: i32,
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'static str,
    pub subcategory: Option<&'static str>,
    pub code: &'a str,
    /// `None` when the resolved schema text is empty.
    pub config_schema: Option<&'a str>,
}

impl<'a> ResolvedDefinition<'a> {
    pub fn from_spec(spec: &'a BlockDefinitionSpec, locale: Locale) -> Self {
        let schema = resolve(&spec.config_schema, locale);
        Self {
            slug: &spec.slug,
            version: spec.version,
            name: resolve(&spec.name, locale),
            description: resolve(&spec.description, locale),
            category: spec.category.as_str(),
            subcategory: spec.subcategory.map(|s| s.as_str()),
            code: &spec.code,
            config_schema: (!schema.trim().is_empty()).then_some(schema),
        }
    }
}

/// One field that differs between store and spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangedField {
    Version { from: i32, to: i32 },
    Name { from: String, to: String },
    Description,
    Category { from: String, to: String },
    Subcategory { from: Option<String>, to: Option<String> },
    Code,
    ConfigSchema,
}

impl fmt::Display for ChangedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Version { from, to } => write!(f, "version: {from} -> {to}"),
            Self::Name { from, to } => write!(f, "name: {from:?} -> {to:?}"),
            Self::Description => write!(f, "description changed"),
            Self::Category { from, to } => write!(f, "category: {from} -> {to}"),
            Self::Subcategory { from, to } => write!(
                f,
                "subcategory: {} -> {}",
                from.as_deref().unwrap_or("none"),
                to.as_deref().unwrap_or("none"),
            ),
            Self::Code => write!(f, "code changed"),
            Self::ConfigSchema => write!(f, "config_schema changed"),
        }
    }
}

/// Compare two optional JSON documents structurally.
///
/// Empty and absent are the same thing. Key order and whitespace are
/// ignored. Text that fails to parse never compares equal, so a corrupt
/// stored schema gets rewritten instead of silently kept.
pub fn json_equal(a: Option<&str>, b: Option<&str>) -> bool {
    let a = a.map(str::trim).filter(|s| !s.is_empty());
    let b = b.map(str::trim).filter(|s| !s.is_empty());

    match (a, b) {
        (None, None) => true,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(a), Some(b)) => {
            let parsed_a = serde_json::from_str::<serde_json::Value>(a);
            let parsed_b = serde_json::from_str::<serde_json::Value>(b);
            match (parsed_a, parsed_b) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// List every migrated field that differs, in a fixed order.
pub fn compare(existing: &BlockDefinitionRecord, spec: &ResolvedDefinition<'_>) -> Vec<ChangedField> {
    let mut changes = Vec::new();

    if existing.version != spec.version {
        changes.push(ChangedField::Version {
            from: existing.version,
            to: spec.version,
        });
    }
    if existing.name != spec.name {
        changes.push(ChangedField::Name {
            from: existing.name.clone(),
            to: spec.name.to_owned(),
        });
    }
    if existing.description != spec.description {
        changes.push(ChangedField::Description);
    }
    if existing.category != spec.category {
        changes.push(ChangedField::Category {
            from: existing.category.clone(),
            to: spec.category.to_owned(),
        });
    }

    let stored_sub = non_empty(existing.subcategory.as_deref());
    let spec_sub = non_empty(spec.subcategory);
    if stored_sub != spec_sub {
        changes.push(ChangedField::Subcategory {
            from: stored_sub.map(str::to_owned),
            to: spec_sub.map(str::to_owned),
        });
    }

    if existing.code != spec.code {
        changes.push(ChangedField::Code);
    }
    if !json_equal(existing.config_schema.as_deref(), spec.config_schema) {
        changes.push(ChangedField::ConfigSchema);
    }

    changes
}

/// Fields that differ between `existing` and `spec` resolved for `locale`.
pub fn changed_fields(
    existing: &BlockDefinitionRecord,
    spec: &BlockDefinitionSpec,
    locale: Locale,
) -> Vec<ChangedField> {
    compare(existing, &ResolvedDefinition::from_spec(spec, locale))
}

/// Whether the stored definition must be rewritten.
pub fn has_changes(existing: &BlockDefinitionRecord, spec: &BlockDefinitionSpec, locale: Locale) -> bool {
    !changed_fields(existing, spec, locale).is_empty()
}

/// Human-readable summary of every differing field, for audit logs.
pub fn describe_changes(
    existing: &BlockDefinitionRecord,
    spec: &BlockDefinitionSpec,
    locale: Locale,
) -> String {
    render(&changed_fields(existing, spec, locale))
}

/// Join a list of changes into one line.
pub fn render(changes: &[ChangedField]) -> String {
    if changes.is_empty() {
        return "no changes".to_owned();
    }
    changes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::LocalizedText;
    use crate::models::{BlockCategory, BlockSubcategory};
    use chrono::Utc;
    use uuid::Uuid;

    fn spec() -> BlockDefinitionSpec {
        BlockDefinitionSpec {
            slug: "http".into(),
            version: 3,
            name: LocalizedText::new("HTTP Request", "HTTPリクエスト"),
            description: LocalizedText::new("Send an HTTP request", "HTTPリクエストを送信"),
            category: BlockCategory::Apps,
            subcategory: None,
            code: "return fetch(config.url);".into(),
            config_schema: LocalizedText::uniform(r#"{"type":"object","properties":{"url":{"type":"string"}}}"#),
            enabled: true,
            parent_slug: None,
        }
    }

    /// A stored record that matches `spec()` resolved for English.
    fn record() -> BlockDefinitionRecord {
        let now = Utc::now();
        BlockDefinitionRecord {
            id: Uuid::new_v4(),
            slug: "http".into(),
            version: 3,
            name: "HTTP Request".into(),
            description: "Send an HTTP request".into(),
            category: "apps".into(),
            subcategory: None,
            code: "return fetch(config.url);".into(),
            config_schema: Some(r#"{ "properties": { "url": { "type": "string" } }, "type": "object" }"#.into()),
            enabled: true,
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    // ---- json_equal -------------------------------------------------------

    #[test]
    fn json_equal_treats_absent_and_empty_alike() {
        assert!(json_equal(None, None));
        assert!(json_equal(Some(""), None));
        assert!(json_equal(None, Some("  ")));
    }

    #[test]
    fn json_equal_one_side_absent_is_unequal() {
        assert!(!json_equal(Some("{}"), None));
        assert!(!json_equal(None, Some("{}")));
    }

    #[test]
    fn json_equal_ignores_key_order_and_whitespace() {
        assert!(json_equal(Some(r#"{"a":1,"b":2}"#), Some(r#"{"b":2,"a":1}"#)));
        assert!(json_equal(Some(r#"{"a":1}"#), Some(r#"{ "a" : 1 }"#)));
    }

    #[test]
    fn json_equal_detects_value_changes() {
        assert!(!json_equal(Some(r#"{"a":1}"#), Some(r#"{"a":2}"#)));
        assert!(!json_equal(Some("[1,2]"), Some("[2,1]")));
    }

    #[test]
    fn json_equal_malformed_input_is_unequal() {
        assert!(!json_equal(Some("{not json"), Some("{not json")));
        assert!(!json_equal(Some(r#"{"a":1}"#), Some("{")));
    }

    // ---- has_changes ------------------------------------------------------

    #[test]
    fn matching_record_has_no_changes() {
        assert!(!has_changes(&record(), &spec(), Locale::En));
        assert_eq!(describe_changes(&record(), &spec(), Locale::En), "no changes");
    }

    #[test]
    fn comparison_uses_the_resolved_locale() {
        let mut stored = record();
        stored.name = "HTTPリクエスト".into();
        stored.description = "HTTPリクエストを送信".into();

        assert!(!has_changes(&stored, &spec(), Locale::Ja));
        assert!(has_changes(&stored, &spec(), Locale::En));
    }

    #[test]
    fn each_field_is_detected_on_its_own() {
        let mut cases: Vec<(BlockDefinitionSpec, &str)> = Vec::new();

        let mut s = spec();
        s.version = 4;
        cases.push((s, "version"));

        let mut s = spec();
        s.name.en = "HTTP".into();
        cases.push((s, "name"));

        let mut s = spec();
        s.description.en = "Call a URL".into();
        cases.push((s, "description"));

        let mut s = spec();
        s.category = BlockCategory::Custom;
        cases.push((s, "category"));

        let mut s = spec();
        s.code = "return null;".into();
        cases.push((s, "code"));

        let mut s = spec();
        s.config_schema = LocalizedText::uniform(r#"{"type":"object"}"#);
        cases.push((s, "config_schema"));

        for (spec, field) in cases {
            let changes = changed_fields(&record(), &spec, Locale::En);
            assert_eq!(changes.len(), 1, "{field}: {changes:?}");
            assert!(render(&changes).contains(field), "{field}");
        }
    }

    #[test]
    fn subcategory_appearing_counts_as_a_change() {
        let mut s = spec();
        s.subcategory = Some(BlockSubcategory::Web);

        assert!(has_changes(&record(), &s, Locale::En));
        assert_eq!(
            changed_fields(&record(), &s, Locale::En),
            vec![ChangedField::Subcategory { from: None, to: Some("web".into()) }]
        );
    }

    #[test]
    fn subcategory_removed_and_empty_string_cases() {
        let mut stored = record();
        stored.subcategory = Some("web".into());
        assert!(has_changes(&stored, &spec(), Locale::En));

        stored.subcategory = Some(String::new());
        assert!(!has_changes(&stored, &spec(), Locale::En));

        let mut s = spec();
        s.subcategory = Some(BlockSubcategory::Web);
        stored.subcategory = Some("web".into());
        assert!(!has_changes(&stored, &s, Locale::En));
    }

    #[test]
    fn schema_absent_on_both_sides_is_unchanged() {
        let mut stored = record();
        stored.config_schema = None;
        let mut s = spec();
        s.config_schema = LocalizedText::default();
        assert!(!has_changes(&stored, &s, Locale::En));

        stored.config_schema = Some(String::new());
        assert!(!has_changes(&stored, &s, Locale::En));
    }

    #[test]
    fn schema_present_on_one_side_is_a_change() {
        let mut stored = record();
        stored.config_schema = None;
        assert!(has_changes(&stored, &spec(), Locale::En));
    }

    #[test]
    fn enabled_flag_is_not_compared() {
        let mut stored = record();
        stored.enabled = false;
        assert!(!has_changes(&stored, &spec(), Locale::En));
    }

    // ---- describe_changes -------------------------------------------------

    #[test]
    fn describe_names_every_changed_field() {
        let mut s = spec();
        s.version = 4;
        s.name.en = "HTTP Call".into();
        s.code = "return null;".into();

        let text = describe_changes(&record(), &s, Locale::En);
        assert!(text.contains("version"), "{text}");
        assert!(text.contains("name"), "{text}");
        assert!(text.contains("code"), "{text}");
        assert_eq!(
            text,
            r#"version: 3 -> 4, name: "HTTP Request" -> "HTTP Call", code changed"#
        );
    }
}
