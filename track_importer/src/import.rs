use crate::database::queries::{InsertOutcome, insert_deployment, replace_deployment};
use crate::error::{ImportError, MainError};
use crate::metadata::{IdentityPolicy, extract_identity};
use crate::track::{TrackError, parse_track};
use shared::geometry::{TrackVertex, encode_linestring};
use shared::model::Deployment;
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Inserted,
    Replaced,
}

/// Runs the full per-file pipeline: identity extraction, track parsing,
/// geometry encoding, then a single conditional write.
pub async fn import_file(
    pool: &Pool<Sqlite>,
    path: &Path,
    policy: IdentityPolicy,
    force: bool,
) -> Result<ImportOutcome, ImportError> {
    let identity = extract_identity(path, policy)?;
    let raw = tokio::fs::read_to_string(path).await?;
    let points = parse_track(&raw)?;

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Err(TrackError::Empty.into());
    };
    let vertices: Vec<TrackVertex> = points
        .iter()
        .map(|p| TrackVertex { lon: p.lon, lat: p.lat })
        .collect();

    let deployment = Deployment {
        name: identity.name,
        region: identity.region,
        year: identity.year,
        start_time: first.time,
        end_time: last.time,
        geometry: encode_linestring(&vertices),
    };

    if force {
        replace_deployment(pool, &deployment).await?;
        info!(
            name = %deployment.name,
            region = %deployment.region,
            year = deployment.year,
            points = points.len(),
            "imported deployment (overwrite enabled)"
        );
        return Ok(ImportOutcome::Replaced);
    }

    match insert_deployment(pool, &deployment).await? {
        InsertOutcome::Inserted => {
            info!(
                name = %deployment.name,
                region = %deployment.region,
                year = deployment.year,
                points = points.len(),
                "imported deployment"
            );
            Ok(ImportOutcome::Inserted)
        }
        InsertOutcome::DuplicateIdentity => Err(ImportError::DuplicateIdentity {
            name: deployment.name,
            region: deployment.region,
            year: deployment.year,
        }),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub imported: usize,
    pub skipped_duplicate: usize,
    pub invalid_identity: usize,
    pub failed: usize,
}

/// Imports every `.json` file under `dir`, one file at a time. Per-file
/// failures are caught here and counted; the batch never aborts early.
pub async fn import_directory(
    pool: &Pool<Sqlite>,
    dir: &Path,
    policy: IdentityPolicy,
    force: bool,
) -> Result<BatchStats, MainError> {
    let files = find_json_files(dir);
    if files.is_empty() {
        return Err(MainError::NoInputFiles(dir.to_path_buf()));
    }
    info!(count = files.len(), dir = %dir.display(), "found input files");

    let mut stats = BatchStats {
        total: files.len(),
        ..BatchStats::default()
    };
    for file in &files {
        match import_file(pool, file, policy, force).await {
            Ok(_) => stats.imported += 1,
            Err(ImportError::Identity(e)) => {
                warn!(path = %file.display(), error = %e, "skipping file with unrecognized identity");
                stats.invalid_identity += 1;
            }
            Err(ImportError::DuplicateIdentity { name, region, year }) => {
                warn!(
                    path = %file.display(),
                    name = %name, region = %region, year,
                    "deployment already exists, skipping (use --force to overwrite)"
                );
                stats.skipped_duplicate += 1;
            }
            Err(e) => {
                warn!(path = %file.display(), error = ?e, "failed to import file");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

/// All `.json` files under the tree, sorted by path so batch order (and the
/// resulting logs) are deterministic.
pub fn find_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
