//! Block definition CRUD operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use store::{BlockDefinitionUpdate, NewBlockDefinition};

use crate::{models::BlockDefinitionRow, DbError};

const COLUMNS: &str = "id, slug, version, name, description, category, subcategory, code, \
                       config_schema, enabled, parent_id, created_at, updated_at";

/// Fetch a definition by its slug; `None` if no row matches.
pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BlockDefinitionRow>, DbError> {
    let row = sqlx::query_as::<_, BlockDefinitionRow>(&format!(
        "SELECT {COLUMNS} FROM block_definitions WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a new definition and return the created row.
pub async fn create(pool: &PgPool, def: &NewBlockDefinition) -> Result<BlockDefinitionRow, DbError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let row = sqlx::query_as::<_, BlockDefinitionRow>(&format!(
        r#"
        INSERT INTO block_definitions
            (id, slug, version, name, description, category, subcategory, code,
             config_schema, enabled, parent_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&def.slug)
    .bind(def.version)
    .bind(&def.name)
    .bind(&def.description)
    .bind(&def.category)
    .bind(&def.subcategory)
    .bind(&def.code)
    .bind(&def.config_schema)
    .bind(def.enabled)
    .bind(def.parent_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Overwrite the migrated columns of a definition.
///
/// `enabled` is left untouched. Returns `DbError::NotFound` if no row was
/// updated.
pub async fn update(pool: &PgPool, id: Uuid, fields: &BlockDefinitionUpdate) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE block_definitions
        SET version = $1, name = $2, description = $3, category = $4, subcategory = $5,
            code = $6, config_schema = $7, parent_id = $8, updated_at = $9
        WHERE id = $10
        "#,
    )
    .bind(fields.version)
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.category)
    .bind(&fields.subcategory)
    .bind(&fields.code)
    .bind(&fields.config_schema)
    .bind(fields.parent_id)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}
