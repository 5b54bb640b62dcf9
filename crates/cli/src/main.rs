//! `blockflow` CLI entry-point.
//!
//! Available sub-commands:
//! - `migrate-db`     — apply the database table schema.
//! - `migrate-blocks` — upsert block definitions in inheritance order.
//! - `validate`       — validate a workflow template JSON file.
//! - `seed-template`  — validate and store a workflow template JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use engine::{
    validate, DefinitionRegistry, Locale, Migrator, MigratorConfig, TemplateSeeder,
    WorkflowTemplate,
};

#[derive(Parser)]
#[command(
    name = "blockflow",
    about = "Block definition migrator and workflow template validator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the database table schema.
    MigrateDb {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Create or update block definitions in parent-before-child order.
    MigrateBlocks {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        /// JSON file with an array of block definition specs; defaults to
        /// the built-in catalogue.
        #[arg(long)]
        definitions: Option<PathBuf>,
        /// Locale whose text is written to the store.
        #[arg(long, env = "BLOCKFLOW_LOCALE", default_value = "en")]
        locale: Locale,
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a workflow template JSON file.
    Validate {
        /// Path to the template JSON file.
        path: PathBuf,
        /// Report every violation instead of only the first.
        #[arg(long)]
        all: bool,
    },
    /// Validate a workflow template JSON file and store it.
    SeedTemplate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        path: PathBuf,
    },
}

fn read_template(path: &Path) -> Result<WorkflowTemplate> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid template JSON in {}", path.display()))
}

fn load_registry(path: Option<&Path>) -> Result<DefinitionRegistry> {
    let Some(path) = path else {
        return Ok(DefinitionRegistry::builtin());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    Ok(DefinitionRegistry::from_json(&content)?)
}

async fn connect(database_url: &str) -> Result<db::PgStore> {
    let pool = db::pool::create_pool(database_url, 2)
        .await
        .context("failed to connect to database")?;
    Ok(db::PgStore::new(pool))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::MigrateDb { database_url } => {
            let store = connect(&database_url).await?;
            db::pool::apply_schema(store.pool()).await?;
            info!("Database schema is up to date");
        }
        Command::MigrateBlocks { database_url, definitions, locale, dry_run } => {
            let registry = load_registry(definitions.as_deref())?;
            let store = connect(&database_url).await?;
            let config = MigratorConfig { default_locale: locale, dry_run };

            let report = Migrator::new(Arc::new(store), config)
                .run(registry.specs())
                .await?;

            println!(
                "{}{} created, {} updated, {} unchanged",
                if report.dry_run { "[dry-run] " } else { "" },
                report.created(),
                report.updated(),
                report.unchanged()
            );
        }
        Command::Validate { path, all } => {
            let template = read_template(&path)?;

            let violations = validate::template_violations(&template);
            if violations.is_empty() {
                println!("✅ Template '{}' is valid.", template.slug);
                return Ok(());
            }

            let shown = if all { violations.len() } else { 1 };
            for violation in violations.iter().take(shown) {
                eprintln!("❌ {violation}");
            }
            std::process::exit(1);
        }
        Command::SeedTemplate { database_url, path } => {
            let template = read_template(&path)?;
            let store = connect(&database_url).await?;

            let outcome = TemplateSeeder::new(Arc::new(store)).seed(&template).await?;
            println!("{}: {outcome:?}", template.slug);
        }
    }

    Ok(())
}
