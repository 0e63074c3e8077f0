use crate::compose::ComposeError;
use crate::database::queries::QueryError;
use shared::error::InitializationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MainError {
    #[error(transparent)]
    Init(#[from] InitializationError),
    #[error("query error: {0}")]
    Query(#[from] QueryError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("no database path given; pass --db or set database.path in Settings.toml")]
    MissingDatabasePath,
    #[error("database not found: {0}")]
    DatabaseNotFound(PathBuf),
}
