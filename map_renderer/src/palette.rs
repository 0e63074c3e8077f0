use shared::model::Deployment;
use std::collections::{BTreeMap, BTreeSet};

/// Colorblind-safe palette (Wong, 2011 - Nature Methods).
/// https://www.nature.com/articles/nmeth.1618
pub const WONG_PALETTE: [&str; 7] = [
    "#0072B2", // Blue
    "#D55E00", // Vermillion
    "#009E73", // Bluish green
    "#CC79A7", // Reddish purple
    "#F0E442", // Yellow
    "#56B4E9", // Sky blue
    "#E69F00", // Orange
];

/// Assigns palette colors to the distinct years present, ascending from
/// palette index 0 and wrapping modulo the palette length. Pure: the same
/// year set always yields the same mapping, whatever the input order.
pub fn assign_year_colors(years: impl IntoIterator<Item = i32>) -> BTreeMap<i32, &'static str> {
    let distinct: BTreeSet<i32> = years.into_iter().collect();
    distinct
        .into_iter()
        .enumerate()
        .map(|(i, year)| (year, WONG_PALETTE[i % WONG_PALETTE.len()]))
        .collect()
}

/// Deployment count per year, ascending by year. Counts come straight from
/// the stored rows so the legend always matches the store.
pub fn count_deployments_by_year(deployments: &[Deployment]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for deployment in deployments {
        *counts.entry(deployment.year).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn deployment(year: i32) -> Deployment {
        Deployment {
            name: format!("glider-{year}"),
            region: "caribbean".to_string(),
            year,
            start_time: "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            end_time: "2024-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            geometry: "LINESTRING(-70.1 41.1, -70.2 41.2)".to_string(),
        }
    }

    #[test]
    fn assignment_is_ascending_from_palette_start() {
        let colors = assign_year_colors([2024, 2023]);
        assert_eq!(colors[&2023], WONG_PALETTE[0]);
        assert_eq!(colors[&2024], WONG_PALETTE[1]);
    }

    #[test]
    fn assignment_ignores_input_order_and_duplicates() {
        let a = assign_year_colors([2025, 2021, 2023, 2021]);
        let b = assign_year_colors([2021, 2023, 2025]);
        assert_eq!(a, b);
    }

    #[test]
    fn years_beyond_palette_length_wrap_deterministically() {
        let years: Vec<i32> = (2018..2027).collect();
        let colors = assign_year_colors(years.iter().copied());
        assert_eq!(colors.len(), 9);
        assert_eq!(colors[&2025], WONG_PALETTE[0]);
        assert_eq!(colors[&2026], WONG_PALETTE[1]);

        let again = assign_year_colors(years.into_iter().rev());
        assert_eq!(colors, again);
    }

    #[test]
    fn counts_match_stored_deployments_per_year() {
        let deployments = vec![deployment(2023), deployment(2023), deployment(2024)];
        let counts = count_deployments_by_year(&deployments);
        assert_eq!(counts[&2023], 2);
        assert_eq!(counts[&2024], 1);
        assert_eq!(counts.len(), 2);
    }
}
