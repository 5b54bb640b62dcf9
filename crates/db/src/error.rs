//! Typed error type for the db crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("row not found")]
    NotFound,

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<DbError> for store::StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => Self::NotFound,
            DbError::Sqlx(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_owned())
            }
            other => Self::backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::StoreError;

    #[test]
    fn not_found_maps_to_store_not_found() {
        assert!(matches!(StoreError::from(DbError::NotFound), StoreError::NotFound));
    }

    #[test]
    fn other_sqlx_errors_become_backend_errors() {
        let err = StoreError::from(DbError::Sqlx(sqlx::Error::RowNotFound));
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(err.to_string().contains("sqlx error"));
    }
}
