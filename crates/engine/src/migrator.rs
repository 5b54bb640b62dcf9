//! Block definition migrator.
//!
//! `Migrator` is the central orchestrator:
//! 1. Orders the definitions parent-before-child (any ordering error aborts
//!    before a single write is issued).
//! 2. Looks each definition up in the store by slug.
//! 3. Creates missing definitions, resolving `parent_id` from the parent
//!    processed earlier in the same run.
//! 4. Updates definitions whose migrated fields differ, logging the diff.
//! 5. Skips everything else.
//!
//! Writes are awaited one at a time in sorted order. Each write commits on
//! its own, so an aborted run leaves the store consistent and a re-run picks
//! up where it stopped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use store::{BlockDefinitionStore, BlockDefinitionUpdate, NewBlockDefinition};

use crate::diff::{compare, render, ChangedField, ResolvedDefinition};
use crate::error::EngineError;
use crate::locale::Locale;
use crate::models::BlockDefinitionSpec;
use crate::sort::sort_by_inheritance;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigratorConfig {
    /// Locale whose text is written to the store.
    pub default_locale: Locale,
    /// Read and diff, but never write.
    pub dry_run: bool,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened (or would happen, in a dry run) to one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationAction {
    Created,
    Updated { changes: Vec<ChangedField> },
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub slug: String,
    pub action: MigrationAction,
}

/// Per-definition outcomes in the order they were processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    pub fn created(&self) -> usize {
        self.count(|a| matches!(a, MigrationAction::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|a| matches!(a, MigrationAction::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|a| matches!(a, MigrationAction::Unchanged))
    }

    /// Slugs in processing order.
    pub fn slugs(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.slug.as_str()).collect()
    }

    fn count(&self, pred: impl Fn(&MigrationAction) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.action)).count()
    }
}

// ---------------------------------------------------------------------------
// Migrator
// ---------------------------------------------------------------------------

/// Stateless orchestrator; every call to [`Migrator::run`] recomputes order
/// and diffs from scratch.
pub struct Migrator {
    store: Arc<dyn BlockDefinitionStore>,
    config: MigratorConfig,
}

impl Migrator {
    pub fn new(store: Arc<dyn BlockDefinitionStore>, config: MigratorConfig) -> Self {
        Self { store, config }
    }

    /// Bring the store in line with `specs`.
    ///
    /// # Errors
    /// - [`EngineError::CycleDetected`] / [`EngineError::DuplicateSlug`]
    ///   before any write.
    /// - [`EngineError::PersistenceFailed`] naming the slug whose read or
    ///   write failed; the run stops there.
    #[instrument(skip(self, specs), fields(definitions = specs.len(), dry_run = self.config.dry_run))]
    pub async fn run(&self, specs: &[BlockDefinitionSpec]) -> Result<MigrationReport, EngineError> {
        let ordered = sort_by_inheritance(specs)?;
        info!(
            "migrating {} block definitions (locale={})",
            ordered.len(),
            self.config.default_locale
        );

        // slug → stored id; `None` marks a definition that a dry run would
        // have created.
        let mut ids: HashMap<&str, Option<Uuid>> = HashMap::with_capacity(ordered.len());
        let mut report = MigrationReport {
            dry_run: self.config.dry_run,
            outcomes: Vec::with_capacity(ordered.len()),
        };

        for spec in ordered {
            let parent_id = resolve_parent(spec, &ids)?;
            let resolved = ResolvedDefinition::from_spec(spec, self.config.default_locale);

            let existing = self
                .store
                .find_by_slug(&spec.slug)
                .await
                .map_err(|e| EngineError::persistence(&spec.slug, e))?;

            let action = match existing {
                None => {
                    let id = self.create(&resolved, spec.enabled, parent_id).await?;
                    ids.insert(&spec.slug, id);
                    MigrationAction::Created
                }
                Some(record) => {
                    ids.insert(&spec.slug, Some(record.id));
                    let changes = compare(&record, &resolved);
                    if changes.is_empty() {
                        debug!("block definition '{}' is up to date", spec.slug);
                        MigrationAction::Unchanged
                    } else {
                        self.update(record.id, &resolved, parent_id, &changes).await?;
                        MigrationAction::Updated { changes }
                    }
                }
            };

            report.outcomes.push(MigrationOutcome {
                slug: spec.slug.clone(),
                action,
            });
        }

        info!(
            "migration finished: {} created, {} updated, {} unchanged",
            report.created(),
            report.updated(),
            report.unchanged()
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Internal: single writes.
    // -----------------------------------------------------------------------

    async fn create(
        &self,
        resolved: &ResolvedDefinition<'_>,
        enabled: bool,
        parent_id: Option<Uuid>,
    ) -> Result<Option<Uuid>, EngineError> {
        if self.config.dry_run {
            info!("[dry-run] would create block definition '{}'", resolved.slug);
            return Ok(None);
        }

        let id = self
            .store
            .create(NewBlockDefinition {
                slug: resolved.slug.to_owned(),
                version: resolved.version,
                name: resolved.name.to_owned(),
                description: resolved.description.to_owned(),
                category: resolved.category.to_owned(),
                subcategory: resolved.subcategory.map(str::to_owned),
                code: resolved.code.to_owned(),
                config_schema: resolved.config_schema.map(str::to_owned),
                enabled,
                parent_id,
            })
            .await
            .map_err(|e| EngineError::persistence(resolved.slug, e))?;

        info!("created block definition '{}' ({})", resolved.slug, id);
        Ok(Some(id))
    }

    async fn update(
        &self,
        id: Uuid,
        resolved: &ResolvedDefinition<'_>,
        parent_id: Option<Uuid>,
        changes: &[ChangedField],
    ) -> Result<(), EngineError> {
        if self.config.dry_run {
            info!(
                "[dry-run] would update block definition '{}': {}",
                resolved.slug,
                render(changes)
            );
            return Ok(());
        }

        info!("updating block definition '{}': {}", resolved.slug, render(changes));
        self.store
            .update(
                id,
                BlockDefinitionUpdate {
                    version: resolved.version,
                    name: resolved.name.to_owned(),
                    description: resolved.description.to_owned(),
                    category: resolved.category.to_owned(),
                    subcategory: resolved.subcategory.map(str::to_owned),
                    code: resolved.code.to_owned(),
                    config_schema: resolved.config_schema.map(str::to_owned),
                    parent_id,
                },
            )
            .await
            .map_err(|e| EngineError::persistence(resolved.slug, e))
    }
}

/// Look up the id assigned to `spec`'s parent earlier in this run.
fn resolve_parent(
    spec: &BlockDefinitionSpec,
    ids: &HashMap<&str, Option<Uuid>>,
) -> Result<Option<Uuid>, EngineError> {
    let Some(parent_slug) = spec.parent_slug.as_deref() else {
        return Ok(None);
    };
    ids.get(parent_slug)
        .copied()
        .ok_or_else(|| EngineError::ParentNotMigrated {
            slug: spec.slug.clone(),
            parent_slug: parent_slug.to_owned(),
        })
}
