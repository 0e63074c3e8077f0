use clap::ValueEnum;
use std::path::Path;
use thiserror::Error;

/// The closed set of supported identity layouts. Which one applies is
/// configuration, never sniffed from the input itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IdentityPolicy {
    /// `.../<region>/<year>/<name>.<ext>`
    StructuredPath,
    /// `.../<region>/<name>-YYYYMMDDThhmm....<ext>`
    FilenameTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    pub name: String,
    pub region: String,
    pub year: i32,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("path {0:?} does not match the <region>/<year>/<name> layout")]
    StructuredLayout(String),
    #[error("filename {0:?} does not match the <name>-YYYYMMDDThhmm pattern")]
    TimestampPattern(String),
    #[error("path {0:?} has no parent directory to use as region")]
    MissingRegion(String),
    #[error("{0:?} is not a four-digit year")]
    Year(String),
}

/// Derives (name, region, year) from a file path under the given policy.
pub fn extract_identity(
    path: &Path,
    policy: IdentityPolicy,
) -> Result<DeploymentIdentity, IdentityError> {
    match policy {
        IdentityPolicy::StructuredPath => extract_from_structured_path(path),
        IdentityPolicy::FilenameTimestamp => extract_from_filename_timestamp(path),
    }
}

fn extract_from_structured_path(path: &Path) -> Result<DeploymentIdentity, IdentityError> {
    let deviation = || IdentityError::StructuredLayout(path.display().to_string());

    let name = file_stem(path).ok_or_else(deviation)?;
    let year_dir = path.parent().and_then(dir_name).ok_or_else(deviation)?;
    let region = path
        .parent()
        .and_then(Path::parent)
        .and_then(dir_name)
        .ok_or_else(deviation)?;

    Ok(DeploymentIdentity {
        name,
        region,
        year: parse_four_digit_year(&year_dir)?,
    })
}

fn extract_from_filename_timestamp(path: &Path) -> Result<DeploymentIdentity, IdentityError> {
    let stem = file_stem(path)
        .ok_or_else(|| IdentityError::TimestampPattern(path.display().to_string()))?;

    // Expected stem shape: <name>-YYYYMMDDT<time digits>
    let (name, timestamp) = stem
        .rsplit_once('-')
        .filter(|(name, ts)| !name.is_empty() && is_timestamp_token(ts))
        .ok_or_else(|| IdentityError::TimestampPattern(stem.clone()))?;

    let region = path
        .parent()
        .and_then(dir_name)
        .ok_or_else(|| IdentityError::MissingRegion(path.display().to_string()))?;

    Ok(DeploymentIdentity {
        name: name.to_string(),
        region,
        year: parse_four_digit_year(&timestamp[..4])?,
    })
}

/// `YYYYMMDDT` followed by at least one digit, digits only throughout.
fn is_timestamp_token(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() > 9
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'T'
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

fn parse_four_digit_year(text: &str) -> Result<i32, IdentityError> {
    let year = text
        .parse::<i32>()
        .map_err(|_| IdentityError::Year(text.to_string()))?;
    if text.len() == 4 && (1000..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(IdentityError::Year(text.to_string()))
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_path_extracts_all_fields() {
        let identity = extract_identity(
            Path::new("data/gulf-of-mexico/2024/bass.json"),
            IdentityPolicy::StructuredPath,
        )
        .unwrap();
        assert_eq!(
            identity,
            DeploymentIdentity {
                name: "bass".to_string(),
                region: "gulf-of-mexico".to_string(),
                year: 2024,
            }
        );
    }

    #[test]
    fn structured_path_rejects_non_numeric_year_dir() {
        let err = extract_identity(
            Path::new("data/gulf-of-mexico/latest/bass.json"),
            IdentityPolicy::StructuredPath,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::Year(_)));
    }

    #[test]
    fn structured_path_rejects_two_digit_year_dir() {
        let err = extract_identity(
            Path::new("data/gulf-of-mexico/24/bass.json"),
            IdentityPolicy::StructuredPath,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::Year(_)));
    }

    #[test]
    fn structured_path_rejects_missing_hierarchy() {
        let err =
            extract_identity(Path::new("bass.json"), IdentityPolicy::StructuredPath).unwrap_err();
        assert!(matches!(err, IdentityError::StructuredLayout(_)));
    }

    #[test]
    fn filename_timestamp_extracts_all_fields() {
        let identity = extract_identity(
            Path::new("data/caribbean/bass-20250601T0000.json"),
            IdentityPolicy::FilenameTimestamp,
        )
        .unwrap();
        assert_eq!(
            identity,
            DeploymentIdentity {
                name: "bass".to_string(),
                region: "caribbean".to_string(),
                year: 2025,
            }
        );
    }

    #[test]
    fn filename_timestamp_keeps_hyphenated_names_intact() {
        let identity = extract_identity(
            Path::new("data/caribbean/sea-bass-01-20231102T153000.json"),
            IdentityPolicy::FilenameTimestamp,
        )
        .unwrap();
        assert_eq!(identity.name, "sea-bass-01");
        assert_eq!(identity.year, 2023);
    }

    #[test]
    fn filename_timestamp_rejects_missing_token() {
        let err = extract_identity(
            Path::new("data/caribbean/bass.json"),
            IdentityPolicy::FilenameTimestamp,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::TimestampPattern(_)));
    }

    #[test]
    fn filename_timestamp_rejects_malformed_token() {
        for stem in ["bass-2025test0601T0000", "bass-20250601X0000", "bass-20250601T"] {
            let path = format!("data/caribbean/{stem}.json");
            let err = extract_identity(Path::new(&path), IdentityPolicy::FilenameTimestamp)
                .unwrap_err();
            assert!(matches!(err, IdentityError::TimestampPattern(_)), "{stem}");
        }
    }

    #[test]
    fn filename_timestamp_rejects_empty_name() {
        let err = extract_identity(
            Path::new("data/caribbean/-20250601T0000.json"),
            IdentityPolicy::FilenameTimestamp,
        )
        .unwrap_err();
        assert!(matches!(err, IdentityError::TimestampPattern(_)));
    }
}
