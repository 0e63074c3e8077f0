use chrono::{DateTime, Utc};

/// One glider's continuous recorded track, keyed by (name, region, year).
///
/// `geometry` holds the WKT LINESTRING text produced at import time; point
/// order inside it is ascending by source timestamp.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Deployment {
    pub name: String,
    pub region: String,
    pub year: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub geometry: String,
}
