#![warn(clippy::pedantic)]
mod compose;
mod database;
mod error;
mod palette;

use crate::compose::{MapOptions, SinglePointPolicy, compose_map};
use crate::database::queries::fetch_all_deployments;
use crate::error::MainError;
use clap::Parser;
use shared::error::InitializationError;
use shared::{connect_db_read_only, init_tracing, load_config};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "map_renderer",
    about = "Render stored glider deployments as an interactive Leaflet map",
    version
)]
struct Cli {
    /// SQLite database path (overrides database.path from Settings.toml)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Where to write the HTML map
    #[arg(long, value_name = "FILE")]
    output_path: PathBuf,
    /// Draw start/end markers on every track
    #[arg(long)]
    markers: bool,
    /// Title banner to display above the map
    #[arg(long, value_name = "TEXT")]
    title: Option<String>,
    /// How to draw a track that holds a single point
    #[arg(long, value_enum, default_value_t = SinglePointPolicy::Marker)]
    single_point: SinglePointPolicy,
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = load_config().map_err(InitializationError::from)?;
    let db_path = cli
        .db
        .clone()
        .or_else(|| config.database_path().map(PathBuf::from))
        .ok_or(MainError::MissingDatabasePath)?;
    if !db_path.is_file() {
        return Err(MainError::DatabaseNotFound(db_path));
    }

    // Read-only snapshot of the store; rendering never observes later writes.
    let pool = connect_db_read_only(&db_path).await?;
    let deployments = fetch_all_deployments(&pool).await?;
    info!(count = deployments.len(), "fetched deployments");

    let options = MapOptions {
        title: cli.title,
        markers: cli.markers,
        single_point: cli.single_point,
    };
    let html = compose_map(&deployments, &options)?;

    tokio::fs::write(&cli.output_path, html).await?;
    info!(path = %cli.output_path.display(), "map created");
    Ok(())
}
