use chrono::{DateTime, Utc};
use geojson::{GeoJson, Value};
use thiserror::Error;

/// One timestamped fix from the raw feature collection.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub lon: f64,
    pub lat: f64,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("track file is not valid GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("track file is not a FeatureCollection")]
    NotAFeatureCollection,
    #[error("track contains no features")]
    Empty,
    #[error("feature {index} does not carry a point geometry")]
    NotAPoint { index: usize },
    #[error("feature {index} has fewer than two coordinates")]
    ShortCoordinates { index: usize },
    #[error("feature {index} is missing the time property")]
    MissingTime { index: usize },
    #[error("feature {index} has unparseable time {value:?}: {source}")]
    InvalidTime {
        index: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parses a GeoJSON feature collection into a time-ordered point sequence.
///
/// All-or-nothing: any feature that is not a point, or lacks a parseable
/// RFC 3339 `time` property, fails the whole file. The sort is stable, so
/// points sharing a timestamp keep their input order.
pub fn parse_track(raw: &str) -> Result<Vec<TrackPoint>, TrackError> {
    let geojson = raw.parse::<GeoJson>()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(TrackError::NotAFeatureCollection);
    };

    if collection.features.is_empty() {
        return Err(TrackError::Empty);
    }

    let mut points = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.iter().enumerate() {
        let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
            return Err(TrackError::NotAPoint { index });
        };
        let (Some(&lon), Some(&lat)) = (coords.first(), coords.get(1)) else {
            return Err(TrackError::ShortCoordinates { index });
        };

        let time_value = feature
            .property("time")
            .and_then(|v| v.as_str())
            .ok_or(TrackError::MissingTime { index })?;
        let time = DateTime::parse_from_rfc3339(time_value)
            .map_err(|source| TrackError::InvalidTime {
                index,
                value: time_value.to_string(),
                source,
            })?
            .with_timezone(&Utc);

        points.push(TrackPoint { lon, lat, time });
    }

    // Stable: ties on time keep original feature order.
    points.sort_by_key(|p| p.time);
    Ok(points)
}
