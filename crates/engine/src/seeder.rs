//! Workflow template seeding.
//!
//! A template is validated first; only an accepted template reaches the
//! store. The graph is then written groups first, steps second (so group
//! containment can be resolved to stored ids) and edges last (so both
//! endpoints already exist).
//!
//! The stored version is raised to the template's version only once the
//! whole graph is written. A seed that fails halfway leaves an older version
//! behind, so the next run rewrites the graph instead of skipping it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use store::{EndpointId, NewBlockGroup, NewEdge, NewStep, NewTemplate, TemplateUpdate, WorkflowTemplateStore};

use crate::error::EngineError;
use crate::models::{EdgeEndpoint, WorkflowTemplate};
use crate::validate::validate_template;

/// What a seed call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created(Uuid),
    Updated(Uuid),
    /// The stored version is the same or newer.
    Unchanged(Uuid),
}

pub struct TemplateSeeder {
    store: Arc<dyn WorkflowTemplateStore>,
}

impl TemplateSeeder {
    pub fn new(store: Arc<dyn WorkflowTemplateStore>) -> Self {
        Self { store }
    }

    /// Validate `template` and write it to the store.
    ///
    /// # Errors
    /// - [`EngineError::ValidationFailed`] before anything is written.
    /// - [`EngineError::PersistenceFailed`] naming the template slug or the
    ///   temp id being written.
    #[instrument(skip(self, template), fields(slug = %template.slug, version = template.version))]
    pub async fn seed(&self, template: &WorkflowTemplate) -> Result<SeedOutcome, EngineError> {
        validate_template(template)?;

        let existing = self
            .store
            .find_template(&template.slug)
            .await
            .map_err(|e| EngineError::persistence(&template.slug, e))?;

        match existing {
            None => {
                let id = self
                    .store
                    .create_template(NewTemplate {
                        slug: template.slug.clone(),
                        name: template.name.clone(),
                        description: template.description.clone(),
                        // Below the final version until the graph is complete.
                        version: template.version.saturating_sub(1),
                    })
                    .await
                    .map_err(|e| EngineError::persistence(&template.slug, e))?;
                self.write_graph(id, template).await?;
                self.commit_version(id, template).await?;
                info!("created workflow template '{}' ({})", template.slug, id);
                Ok(SeedOutcome::Created(id))
            }
            Some(record) if record.version < template.version => {
                self.store
                    .clear_graph(record.id)
                    .await
                    .map_err(|e| EngineError::persistence(&template.slug, e))?;
                self.write_graph(record.id, template).await?;
                self.commit_version(record.id, template).await?;
                info!(
                    "updated workflow template '{}' v{} -> v{}",
                    template.slug, record.version, template.version
                );
                Ok(SeedOutcome::Updated(record.id))
            }
            Some(record) => {
                if record.version > template.version {
                    warn!(
                        "stored workflow template '{}' is newer (v{} > v{}), leaving it alone",
                        template.slug, record.version, template.version
                    );
                }
                Ok(SeedOutcome::Unchanged(record.id))
            }
        }
    }

    /// Write the header fields at the template's final version.
    async fn commit_version(&self, template_id: Uuid, template: &WorkflowTemplate) -> Result<(), EngineError> {
        self.store
            .update_template(
                template_id,
                TemplateUpdate {
                    name: template.name.clone(),
                    description: template.description.clone(),
                    version: template.version,
                },
            )
            .await
            .map_err(|e| EngineError::persistence(&template.slug, e))
    }

    async fn write_graph(&self, template_id: Uuid, template: &WorkflowTemplate) -> Result<(), EngineError> {
        let mut group_ids: HashMap<&str, Uuid> = HashMap::with_capacity(template.block_groups.len());
        for group in &template.block_groups {
            let id = self
                .store
                .create_group(
                    template_id,
                    NewBlockGroup {
                        name: group.name.clone(),
                        group_type: group.group_type.as_str().to_owned(),
                        config: group.config.clone(),
                    },
                )
                .await
                .map_err(|e| EngineError::persistence(&group.temp_id, e))?;
            group_ids.insert(&group.temp_id, id);
        }

        let mut step_ids: HashMap<&str, Uuid> = HashMap::with_capacity(template.steps.len());
        for step in &template.steps {
            // Validation guarantees every containment reference resolves.
            let block_group_id = step
                .block_group_temp_id
                .as_deref()
                .and_then(|g| group_ids.get(g).copied());
            let id = self
                .store
                .create_step(
                    template_id,
                    NewStep {
                        name: step.name.clone(),
                        step_type: step.step_type.clone(),
                        config: step.config.clone(),
                        block_group_id,
                        trigger_type: step.trigger_type.clone(),
                        trigger_config: step.trigger_config.clone(),
                        position: step.position.map(|p| (p.x, p.y)),
                    },
                )
                .await
                .map_err(|e| EngineError::persistence(&step.temp_id, e))?;
            step_ids.insert(&step.temp_id, id);
        }

        let resolve = |endpoint: &EdgeEndpoint| -> Result<EndpointId, EngineError> {
            let resolved = match endpoint {
                EdgeEndpoint::StepRef(id) => step_ids.get(id.as_str()).copied().map(EndpointId::Step),
                EdgeEndpoint::GroupRef(id) => group_ids.get(id.as_str()).copied().map(EndpointId::Group),
            };
            resolved.ok_or_else(|| {
                EngineError::persistence(endpoint.temp_id(), store::StoreError::NotFound)
            })
        };

        for edge in &template.edges {
            let new_edge = NewEdge {
                source: resolve(&edge.source)?,
                target: resolve(&edge.target)?,
                source_port: edge.source_port.clone(),
                target_port: edge.target_port.clone(),
            };
            self.store
                .create_edge(template_id, new_edge)
                .await
                .map_err(|e| {
                    EngineError::persistence(
                        format!("{}->{}", edge.source.temp_id(), edge.target.temp_id()),
                        e,
                    )
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockGroup, BlockGroupType, Edge, Step};
    use serde_json::json;
    use store::memory::StoreWrite;
    use store::InMemoryStore;

    fn step(temp_id: &str, step_type: &str, group: Option<&str>) -> Step {
        Step {
            temp_id: temp_id.into(),
            name: temp_id.into(),
            step_type: step_type.into(),
            config: json!({}),
            block_group_temp_id: group.map(Into::into),
            trigger_type: (step_type == "start").then(|| "manual".to_string()),
            trigger_config: None,
            position: None,
        }
    }

    fn template(version: i32) -> WorkflowTemplate {
        WorkflowTemplate {
            id: Uuid::new_v4(),
            slug: "parallel-research".into(),
            name: "Parallel research".into(),
            description: "Fan out two searches and summarize".into(),
            version,
            steps: vec![
                step("start", "start", None),
                step("search_a", "http", Some("fan")),
                step("search_b", "http", Some("fan")),
                step("summary", "llm", None),
            ],
            edges: vec![
                Edge::new(EdgeEndpoint::StepRef("start".into()), EdgeEndpoint::GroupRef("fan".into())),
                Edge::new(EdgeEndpoint::GroupRef("fan".into()), EdgeEndpoint::StepRef("summary".into())),
            ],
            block_groups: vec![BlockGroup {
                temp_id: "fan".into(),
                name: "Fan out".into(),
                group_type: BlockGroupType::Parallel,
                config: json!({}),
            }],
        }
    }

    #[tokio::test]
    async fn new_template_is_written_groups_steps_edges() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());

        let outcome = seeder.seed(&template(1)).await.expect("seeded");
        let SeedOutcome::Created(id) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };

        let groups = store.groups(id);
        let steps = store.steps(id);
        let edges = store.edges(id);
        assert_eq!(groups.len(), 1);
        assert_eq!(steps.len(), 4);
        assert_eq!(edges.len(), 2);

        let fan = groups[0].id;
        let contained = steps.iter().filter(|s| s.step.block_group_id == Some(fan)).count();
        assert_eq!(contained, 2);

        let summary = steps.iter().find(|s| s.step.name == "summary").unwrap().id;
        assert_eq!(edges[1].edge.source, EndpointId::Group(fan));
        assert_eq!(edges[1].edge.target, EndpointId::Step(summary));

        let kinds: Vec<&str> = store
            .writes()
            .iter()
            .map(|w| match w {
                StoreWrite::CreateTemplate { .. } => "template",
                StoreWrite::CreateGroup { .. } => "group",
                StoreWrite::CreateStep { .. } => "step",
                StoreWrite::CreateEdge { .. } => "edge",
                StoreWrite::UpdateTemplate { .. } => "commit",
                _ => "other",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["template", "group", "step", "step", "step", "step", "edge", "edge", "commit"]
        );
    }

    #[tokio::test]
    async fn same_version_is_left_alone() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());

        seeder.seed(&template(1)).await.unwrap();
        let writes = store.write_count();

        assert!(matches!(seeder.seed(&template(1)).await, Ok(SeedOutcome::Unchanged(_))));
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn higher_version_replaces_the_graph() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());

        let SeedOutcome::Created(id) = seeder.seed(&template(1)).await.unwrap() else {
            panic!("expected Created");
        };

        let mut v2 = template(2);
        v2.steps.retain(|s| s.temp_id != "search_b");
        assert_eq!(seeder.seed(&v2).await.unwrap(), SeedOutcome::Updated(id));

        assert_eq!(store.template("parallel-research").unwrap().version, 2);
        assert_eq!(store.steps(id).len(), 3);
        assert_eq!(store.edges(id).len(), 2);
        assert!(store.writes().contains(&StoreWrite::ClearGraph { template_id: id }));
    }

    #[tokio::test]
    async fn invalid_template_never_reaches_the_store() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());

        let mut bad = template(1);
        bad.steps[0].step_type = "llm".into();

        let err = seeder.seed(&bad).await.unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(ref v) if v.field == "steps"));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_names_the_template() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_writes_for("parallel-research");
        let seeder = TemplateSeeder::new(store.clone());

        match seeder.seed(&template(1)).await {
            Err(EngineError::PersistenceFailed { key, .. }) => assert_eq!(key, "parallel-research"),
            other => panic!("expected persistence failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_create_is_repaired_on_retry() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());

        store.fail_next_edges(1);
        match seeder.seed(&template(1)).await {
            Err(EngineError::PersistenceFailed { key, .. }) => assert_eq!(key, "start->fan"),
            other => panic!("expected persistence failure, got {other:?}"),
        }
        assert_eq!(store.template("parallel-research").unwrap().version, 0);

        let outcome = seeder.seed(&template(1)).await.expect("retry succeeds");
        let SeedOutcome::Updated(id) = outcome else {
            panic!("expected Updated, got {outcome:?}");
        };
        assert_eq!(store.template("parallel-research").unwrap().version, 1);
        assert_eq!(store.groups(id).len(), 1);
        assert_eq!(store.steps(id).len(), 4);
        assert_eq!(store.edges(id).len(), 2);
    }

    #[tokio::test]
    async fn failed_update_keeps_the_old_version_until_retried() {
        let store = Arc::new(InMemoryStore::new());
        let seeder = TemplateSeeder::new(store.clone());
        let SeedOutcome::Created(id) = seeder.seed(&template(1)).await.unwrap() else {
            panic!("expected Created");
        };

        let mut v2 = template(2);
        v2.steps.retain(|s| s.temp_id != "search_b");

        store.fail_next_edges(1);
        assert!(seeder.seed(&v2).await.is_err());
        assert_eq!(store.template("parallel-research").unwrap().version, 1);
        assert!(store.edges(id).is_empty());

        assert_eq!(seeder.seed(&v2).await.unwrap(), SeedOutcome::Updated(id));
        assert_eq!(store.template("parallel-research").unwrap().version, 2);
        assert_eq!(store.steps(id).len(), 3);
        assert_eq!(store.edges(id).len(), 2);

        assert!(matches!(seeder.seed(&v2).await, Ok(SeedOutcome::Unchanged(_))));
    }
}
