//! `engine` crate — block definition ordering, change detection, the
//! migrator, and workflow template validation/seeding.

pub mod models;
pub mod error;
pub mod locale;
pub mod sort;
pub mod diff;
pub mod migrator;
pub mod validate;
pub mod registry;
pub mod seeder;

pub use models::{BlockDefinitionSpec, WorkflowTemplate, Step, BlockGroup, Edge, EdgeEndpoint};
pub use error::{EngineError, ValidationError};
pub use locale::{Locale, LocalizedText};
pub use sort::sort_by_inheritance;
pub use diff::{describe_changes, has_changes, json_equal};
pub use migrator::{Migrator, MigratorConfig, MigrationReport};
pub use validate::validate_template;
pub use registry::DefinitionRegistry;
pub use seeder::{TemplateSeeder, SeedOutcome};
