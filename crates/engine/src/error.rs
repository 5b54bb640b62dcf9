//! Engine-level error types.

use std::fmt;

use thiserror::Error;

/// Why a set of block definitions could not be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleCause {
    /// A definition names itself as its parent.
    SelfReference,
    /// A definition names a parent that is not part of the set.
    MissingParent,
    /// Two or more definitions inherit from each other.
    Cycle,
}

impl fmt::Display for CycleCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReference => write!(f, "self-reference"),
            Self::MissingParent => write!(f, "missing parent"),
            Self::Cycle => write!(f, "inheritance cycle"),
        }
    }
}

/// A structural violation in a workflow template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending field, e.g. `steps[2].temp_id`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors produced by the engine (ordering, validation, persistence).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Ordering errors ------

    /// The inheritance relation cannot be ordered parent-before-child.
    #[error("cannot order block definitions ({cause}): {}", slugs.join(", "))]
    CycleDetected {
        slugs: Vec<String>,
        cause: CycleCause,
    },

    /// Two definitions share a slug.
    #[error("duplicate block definition slug: '{0}'")]
    DuplicateSlug(String),

    // ------ Validation errors ------

    #[error("workflow template rejected: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// A definitions file could not be parsed.
    #[error("invalid block definitions: {0}")]
    InvalidDefinitions(#[from] serde_json::Error),

    // ------ Persistence errors ------

    /// The store rejected a read or write; `key` is the slug or temp id
    /// being processed.
    #[error("persistence failed for '{key}': {source}")]
    PersistenceFailed {
        key: String,
        #[source]
        source: store::StoreError,
    },

    /// A child was reached before its parent had an id.
    #[error("parent '{parent_slug}' of '{slug}' has not been migrated")]
    ParentNotMigrated { slug: String, parent_slug: String },
}

impl EngineError {
    pub(crate) fn persistence(key: impl Into<String>, source: store::StoreError) -> Self {
        Self::PersistenceFailed {
            key: key.into(),
            source,
        }
    }
}
