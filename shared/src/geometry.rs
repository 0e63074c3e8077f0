use thiserror::Error;

/// A single (longitude, latitude) vertex of a track line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackVertex {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("geometry text is not a LINESTRING: {0:?}")]
    NotALineString(String),
    #[error("linestring contains no coordinates")]
    Empty,
    #[error("malformed coordinate pair {pair:?}")]
    MalformedPair { pair: String },
    #[error("unparseable coordinate {value:?}: {source}")]
    Coordinate {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },
}

/// Encodes an ordered vertex sequence as WKT `LINESTRING(lon lat, ...)`.
///
/// Vertices are written with `f64` Display formatting, which round-trips
/// exactly, so [`decode_linestring`] reproduces the input bit-for-bit.
/// A single vertex encodes as a degenerate one-vertex linestring; the
/// renderer decides whether to skip it or draw it as a point.
pub fn encode_linestring(vertices: &[TrackVertex]) -> String {
    let coords = vertices
        .iter()
        .map(|v| format!("{} {}", v.lon, v.lat))
        .collect::<Vec<_>>()
        .join(", ");
    format!("LINESTRING({coords})")
}

/// Decodes WKT `LINESTRING(...)` text back into its ordered vertices.
pub fn decode_linestring(text: &str) -> Result<Vec<TrackVertex>, GeometryError> {
    let body = text
        .strip_prefix("LINESTRING(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| GeometryError::NotALineString(text.to_string()))?;

    if body.trim().is_empty() {
        return Err(GeometryError::Empty);
    }

    let mut vertices = Vec::new();
    for pair in body.split(',') {
        let mut parts = pair.split_whitespace();
        let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(GeometryError::MalformedPair {
                pair: pair.trim().to_string(),
            });
        };
        vertices.push(TrackVertex {
            lon: parse_coordinate(lon)?,
            lat: parse_coordinate(lat)?,
        });
    }

    Ok(vertices)
}

fn parse_coordinate(value: &str) -> Result<f64, GeometryError> {
    value.parse::<f64>().map_err(|source| GeometryError::Coordinate {
        value: value.to_string(),
        source,
    })
}
