//! noteful-seed: wipe the database and load the bundled fixtures.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use noteful_crypto::PasswordHasher;
use noteful_db::{seed_database, Database, PoolConfig, SeedData};

#[derive(Parser)]
#[command(name = "noteful-seed")]
#[command(author, version, about = "Reset the noteful database to the bundled fixtures")]
struct Cli {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Validate the fixtures without touching the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("noteful_db=info,noteful_seed=info")),
        )
        .init();

    let cli = Cli::parse();

    let data = SeedData::bundled().context("failed to parse bundled fixtures")?;
    data.validate().context("bundled fixtures are inconsistent")?;

    if cli.dry_run {
        info!(
            users = data.users.len(),
            folders = data.folders.len(),
            tags = data.tags.len(),
            notes = data.notes.len(),
            "Fixtures valid, dry run requested; database untouched"
        );
        return Ok(());
    }

    let database_url = cli
        .database_url
        .context("DATABASE_URL must be set (or pass --database-url)")?;

    let db = Database::connect(&database_url, PoolConfig::default())
        .await
        .context("failed to connect to database")?;
    db.migrate().await.context("failed to run migrations")?;

    let hasher = PasswordHasher::default();
    let report = seed_database(db.pool(), &data, &hasher)
        .await
        .context("seeding failed")?;

    info!(
        users = report.users,
        folders = report.folders,
        tags = report.tags,
        notes = report.notes,
        note_tags = report.note_tags,
        "Database seeded"
    );

    db.close().await;
    Ok(())
}
