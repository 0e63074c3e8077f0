use crate::database::queries::QueryError;
use crate::metadata::IdentityError;
use crate::track::TrackError;
use shared::error::InitializationError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while importing one file. Bulk mode catches
/// these at the batch boundary; single-file mode propagates them out of main.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid deployment identity: {0}")]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error("deployment {name} ({region}/{year}) already exists; use --force to overwrite")]
    DuplicateIdentity {
        name: String,
        region: String,
        year: i32,
    },
    #[error("query error: {0}")]
    Query(#[from] QueryError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MainError {
    #[error(transparent)]
    Init(#[from] InitializationError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("no database path given; pass --db or set database.path in Settings.toml")]
    MissingDatabasePath,
    #[error("one of --data-file or --data-dir is required")]
    MissingDataSource,
    #[error("data file not found: {0}")]
    DataFileNotFound(PathBuf),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("no .json files found in {0}")]
    NoInputFiles(PathBuf),
    #[error("{failed} of {total} files failed to import")]
    BatchFailures { failed: usize, total: usize },
}
