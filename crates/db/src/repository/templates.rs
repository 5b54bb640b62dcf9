//! Workflow template, block group, step and edge operations.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use store::{EndpointId, NewBlockGroup, NewEdge, NewStep, NewTemplate, TemplateUpdate};

use crate::{models::WorkflowTemplateRow, DbError};

// ---------------------------------------------------------------------------
// workflow_templates
// ---------------------------------------------------------------------------

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<WorkflowTemplateRow>, DbError> {
    let row = sqlx::query_as::<_, WorkflowTemplateRow>(
        r#"
        SELECT id, slug, name, description, version, created_at, updated_at
        FROM workflow_templates WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn create_template(pool: &PgPool, template: &NewTemplate) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO workflow_templates (id, slug, name, description, version, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        "#,
    )
    .bind(id)
    .bind(&template.slug)
    .bind(&template.name)
    .bind(&template.description)
    .bind(template.version)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update_template(pool: &PgPool, id: Uuid, fields: &TemplateUpdate) -> Result<(), DbError> {
    let result = sqlx::query(
        r#"
        UPDATE workflow_templates
        SET name = $1, description = $2, version = $3, updated_at = $4
        WHERE id = $5
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(fields.version)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Delete a template's edges, steps and groups in one transaction.
pub async fn clear_graph(pool: &PgPool, template_id: Uuid) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for table in ["template_edges", "template_steps", "template_block_groups"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE template_id = $1"))
            .bind(template_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// graph rows
// ---------------------------------------------------------------------------

pub async fn create_group(pool: &PgPool, template_id: Uuid, group: &NewBlockGroup) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO template_block_groups (id, template_id, name, group_type, config)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(template_id)
    .bind(&group.name)
    .bind(&group.group_type)
    .bind(&group.config)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn create_step(pool: &PgPool, template_id: Uuid, step: &NewStep) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();
    let (x, y) = step.position.unzip();

    sqlx::query(
        r#"
        INSERT INTO template_steps
            (id, template_id, name, step_type, config, block_group_id,
             trigger_type, trigger_config, position_x, position_y)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(id)
    .bind(template_id)
    .bind(&step.name)
    .bind(&step.step_type)
    .bind(&step.config)
    .bind(step.block_group_id)
    .bind(&step.trigger_type)
    .bind(&step.trigger_config)
    .bind(x)
    .bind(y)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Split an endpoint into its (step, group) column pair.
fn endpoint_columns(endpoint: EndpointId) -> (Option<Uuid>, Option<Uuid>) {
    match endpoint {
        EndpointId::Step(id) => (Some(id), None),
        EndpointId::Group(id) => (None, Some(id)),
    }
}

pub async fn create_edge(pool: &PgPool, template_id: Uuid, edge: &NewEdge) -> Result<Uuid, DbError> {
    let id = Uuid::new_v4();
    let (source_step, source_group) = endpoint_columns(edge.source);
    let (target_step, target_group) = endpoint_columns(edge.target);

    sqlx::query(
        r#"
        INSERT INTO template_edges
            (id, template_id, source_step_id, source_group_id,
             target_step_id, target_group_id, source_port, target_port)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(template_id)
    .bind(source_step)
    .bind(source_group)
    .bind(target_step)
    .bind(target_group)
    .bind(&edge.source_port)
    .bind(&edge.target_port)
    .execute(pool)
    .await?;

    Ok(id)
}
