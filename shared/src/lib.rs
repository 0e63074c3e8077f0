pub mod geometry;
pub mod model;

use crate::error::{ConfigError, InitializationError};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const ENV_VAR_PREFIX: &str = "GLIDER_ATLAS_";
pub const SETTINGS_FILE: &str = "Settings.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

pub fn load_config() -> Result<Config, ConfigError> {
    Ok(Figment::new()
        .merge(Toml::file(SETTINGS_FILE))
        .merge(Env::prefixed(ENV_VAR_PREFIX).split("_"))
        .extract::<Config>()?)
}

impl Config {
    pub fn database_path(&self) -> Option<&str> {
        self.database.as_ref().map(|d| d.path.as_str())
    }
}

pub fn init_tracing() -> Result<(), InitializationError> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

pub mod error {
    use thiserror::Error;
    use tracing::dispatcher::SetGlobalDefaultError;

    #[derive(Debug, Error)]
    pub enum ConfigError {
        #[error("failed to load configuration: {0}")]
        Figment(#[from] figment::Error),
    }

    #[derive(Debug, Error)]
    pub enum InitializationError {
        #[error(transparent)]
        Tracing(#[from] SetGlobalDefaultError),
        #[error(transparent)]
        Config(#[from] crate::error::ConfigError),
        #[error(transparent)]
        Db(#[from] sqlx::Error),
    }
}

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS deployments (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        region     TEXT NOT NULL,
        year       INTEGER NOT NULL,
        start_time TEXT NOT NULL,
        end_time   TEXT NOT NULL,
        geometry   TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (name, region, year)
    )
";

pub async fn initialize_db(db_path: &str) -> Result<Pool<Sqlite>, InitializationError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!(name: "db.connected", path = db_path, "db pool created and connected");

    apply_schema(&pool).await?;
    Ok(pool)
}

/// Read-only pool for rendering; never creates the file or touches the schema.
pub async fn connect_db_read_only(
    db_path: impl AsRef<Path>,
) -> Result<Pool<Sqlite>, InitializationError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn apply_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(SCHEMA).execute(pool).await?;
    Ok(())
}
