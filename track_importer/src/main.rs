#![warn(clippy::pedantic)]
mod database;
mod error;
mod import;
mod metadata;
mod track;

use crate::error::MainError;
use crate::import::{import_directory, import_file};
use crate::metadata::IdentityPolicy;
use clap::Parser;
use shared::error::InitializationError;
use shared::{init_tracing, initialize_db, load_config};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "track_importer",
    about = "Import glider deployment GeoJSON tracks into the deployment store",
    version
)]
struct Cli {
    /// Path to a single GeoJSON file to import
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "data_dir",
        required_unless_present = "data_dir"
    )]
    data_file: Option<PathBuf>,
    /// Directory tree to scan recursively for .json files
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// SQLite database path (overrides database.path from Settings.toml)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Overwrite an existing deployment with the same (name, region, year)
    #[arg(long)]
    force: bool,
    /// How to derive (name, region, year) from each input path
    #[arg(long, value_enum, default_value_t = IdentityPolicy::FilenameTimestamp)]
    layout: IdentityPolicy,
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = load_config().map_err(InitializationError::from)?;
    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.display().to_string())
        .or_else(|| config.database_path().map(ToString::to_string))
        .ok_or(MainError::MissingDatabasePath)?;
    let pool = initialize_db(&db_path).await?;

    if let Some(data_file) = &cli.data_file {
        // Single-file mode: the first failure aborts with a nonzero exit.
        if !data_file.is_file() {
            return Err(MainError::DataFileNotFound(data_file.clone()));
        }
        import_file(&pool, data_file, cli.layout, cli.force).await?;
        info!("import completed");
        return Ok(());
    }

    let Some(data_dir) = &cli.data_dir else {
        return Err(MainError::MissingDataSource);
    };
    if !data_dir.is_dir() {
        return Err(MainError::NotADirectory(data_dir.clone()));
    }

    let stats = import_directory(&pool, data_dir, cli.layout, cli.force).await?;
    info!(
        total = stats.total,
        imported = stats.imported,
        skipped_duplicate = stats.skipped_duplicate,
        invalid_identity = stats.invalid_identity,
        failed = stats.failed,
        "batch import summary"
    );

    if stats.failed > 0 {
        Err(MainError::BatchFailures {
            failed: stats.failed,
            total: stats.total,
        })
    } else {
        Ok(())
    }
}
