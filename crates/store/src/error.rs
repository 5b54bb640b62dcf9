//! Store-level error type.

use thiserror::Error;

/// Errors returned by a persistence collaborator.
///
/// Implementations map their backend failures onto these variants so the
/// engine never needs to know which database sits behind the trait.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row addressed by id does not exist.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint was violated (e.g. a slug inserted twice).
    #[error("conflicting record: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}
