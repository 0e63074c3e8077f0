use crate::palette::{assign_year_colors, count_deployments_by_year};
use clap::ValueEnum;
use shared::geometry::{GeometryError, TrackVertex, decode_linestring};
use shared::model::Deployment;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::warn;

/// Start/end overlay colors, deliberately outside the track palette so the
/// overlays never blend into a year color.
const START_MARKER_COLOR: &str = "#FFFFFF";
const END_MARKER_COLOR: &str = "#000000";

const USGS_TOPO_TILES: &str =
    "https://basemap.nationalmap.gov/arcgis/rest/services/USGSTopo/MapServer/tile/{z}/{y}/{x}";
const USGS_ATTRIBUTION: &str = "U.S. Department of the Interior | U.S. Geological Survey";

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const DOM_TO_IMAGE_JS: &str =
    "https://unpkg.com/dom-to-image-more@3.3.0/dist/dom-to-image-more.min.js";

/// What to do with a stored track that decodes to a single vertex, which a
/// polyline cannot draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SinglePointPolicy {
    /// Leave it off the map and log a warning.
    Skip,
    /// Draw it as a single circle marker in its year color.
    #[default]
    Marker,
}

#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub title: Option<String>,
    pub markers: bool,
    pub single_point: SinglePointPolicy,
}

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("store contains no deployments")]
    EmptyStore,
    #[error("no drawable geometry in the store")]
    NoDrawableGeometry,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Assembles the full self-contained HTML map document: one styled polyline
/// per deployment in document order, optional start/end overlays drawn after
/// every track, the always-present year legend, optional title banner, and
/// the export-to-PNG control.
pub fn compose_map(
    deployments: &[Deployment],
    options: &MapOptions,
) -> Result<String, ComposeError> {
    if deployments.is_empty() {
        return Err(ComposeError::EmptyStore);
    }

    let year_colors = assign_year_colors(deployments.iter().map(|d| d.year));
    let year_counts = count_deployments_by_year(deployments);

    let mut tracks = Vec::with_capacity(deployments.len());
    for deployment in deployments {
        let vertices = decode_linestring(&deployment.geometry)?;
        if vertices.len() < 2 && options.single_point == SinglePointPolicy::Skip {
            warn!(
                name = %deployment.name,
                region = %deployment.region,
                year = deployment.year,
                "skipping single-point track"
            );
            continue;
        }
        tracks.push((deployment, vertices));
    }

    let bounds = track_bounds(tracks.iter().flat_map(|(_, v)| v.iter()))
        .ok_or(ComposeError::NoDrawableGeometry)?;

    let mut script = String::new();
    script.push_str("var map = L.map('map');\n");
    let _ = writeln!(
        script,
        "L.tileLayer('{USGS_TOPO_TILES}', {{maxZoom: 16, attribution: '{USGS_ATTRIBUTION}'}}).addTo(map);"
    );
    script.push_str(&build_tracks_js(&tracks, &year_colors));
    if options.markers {
        script.push_str(&build_start_end_markers_js(&tracks));
    }
    let _ = writeln!(
        script,
        "map.fitBounds([[{}, {}], [{}, {}]]);",
        bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon
    );
    script.push_str(&build_legend_js(&year_colors, &year_counts, options.markers));
    if let Some(title) = &options.title {
        script.push_str(&build_title_js(title));
    }
    script.push_str(SAVE_BUTTON_JS);

    let page_title = options.title.as_deref().unwrap_or("Glider Deployment Map");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="{LEAFLET_CSS}">
<script src="{LEAFLET_JS}"></script>
<script src="{DOM_TO_IMAGE_JS}"></script>
<style>
html, body {{ height: 100%; margin: 0; }}
#map {{ height: 100%; }}
{SAVE_BUTTON_CSS}
</style>
</head>
<body>
<div id="map"></div>
<script>
{script}</script>
</body>
</html>
"#,
        title = html_escape(page_title),
    ))
}

struct Bounds {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

fn track_bounds<'a>(vertices: impl Iterator<Item = &'a TrackVertex>) -> Option<Bounds> {
    let mut bounds: Option<Bounds> = None;
    for v in vertices {
        match &mut bounds {
            None => {
                bounds = Some(Bounds {
                    min_lat: v.lat,
                    min_lon: v.lon,
                    max_lat: v.lat,
                    max_lon: v.lon,
                });
            }
            Some(b) => {
                b.min_lat = b.min_lat.min(v.lat);
                b.min_lon = b.min_lon.min(v.lon);
                b.max_lat = b.max_lat.max(v.lat);
                b.max_lon = b.max_lon.max(v.lon);
            }
        }
    }
    bounds
}

/// Tracks are emitted in document order; a single-vertex track that survived
/// the skip policy becomes a circle marker in its year color.
fn build_tracks_js(
    tracks: &[(&Deployment, Vec<TrackVertex>)],
    year_colors: &BTreeMap<i32, &'static str>,
) -> String {
    let mut js = String::new();
    for (deployment, vertices) in tracks {
        let color = year_colors.get(&deployment.year).copied().unwrap_or("#999999");
        let tooltip = html_escape(&format!(
            "{} ({}, {})",
            deployment.name, deployment.region, deployment.year
        ));
        if let [only] = vertices.as_slice() {
            let _ = writeln!(
                js,
                "L.circleMarker([{lat}, {lon}], {{radius: 4, color: '{color}', fillColor: '{color}', fillOpacity: 1.0}}).bindTooltip('{tooltip}').addTo(map);",
                lat = only.lat,
                lon = only.lon,
            );
        } else {
            let coords = latlon_array(vertices);
            let _ = writeln!(
                js,
                "L.polyline({coords}, {{color: '{color}', weight: 2, opacity: 0.8}}).bindTooltip('{tooltip}').addTo(map);"
            );
        }
    }
    js
}

/// Start/end overlays come after every polyline so no track occludes them.
fn build_start_end_markers_js(tracks: &[(&Deployment, Vec<TrackVertex>)]) -> String {
    let mut js = String::new();
    for (deployment, vertices) in tracks {
        let (Some(start), Some(end)) = (vertices.first(), vertices.last()) else {
            continue;
        };
        let name = html_escape(&deployment.name);
        let _ = writeln!(
            js,
            "L.circleMarker([{lat}, {lon}], {{radius: 4, color: '{END_MARKER_COLOR}', fillColor: '{START_MARKER_COLOR}', fillOpacity: 1.0}}).bindTooltip('Start: {name}').addTo(map);",
            lat = start.lat,
            lon = start.lon,
        );
        let _ = writeln!(
            js,
            "L.circleMarker([{lat}, {lon}], {{radius: 4, color: '{END_MARKER_COLOR}', fillColor: '{END_MARKER_COLOR}', fillOpacity: 1.0}}).bindTooltip('End: {name}').addTo(map);",
            lat = end.lat,
            lon = end.lon,
        );
    }
    js
}

fn latlon_array(vertices: &[TrackVertex]) -> String {
    let pairs = vertices
        .iter()
        .map(|v| format!("[{}, {}]", v.lat, v.lon))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{pairs}]")
}

fn build_legend_js(
    year_colors: &BTreeMap<i32, &'static str>,
    year_counts: &BTreeMap<i32, usize>,
    markers: bool,
) -> String {
    let mut rows = String::new();
    for (year, count) in year_counts {
        let color = year_colors.get(year).copied().unwrap_or("#999999");
        let _ = write!(
            rows,
            r#"<div style="display: flex; align-items: center; margin: 3px 0;"><span style="background-color: {color}; width: 20px; height: 4px; margin-right: 8px;"></span><span>{year}: {count}</span></div>"#
        );
    }

    let total: usize = year_counts.values().sum();
    let _ = write!(
        rows,
        r#"<div style="border-top: 1px solid #ccc; margin-top: 8px; padding-top: 8px; font-weight: bold;">Total: {total}</div>"#
    );

    if markers {
        let _ = write!(
            rows,
            r#"<div style="border-top: 1px solid #ccc; margin-top: 8px; padding-top: 8px;"><div style="display: flex; align-items: center; margin: 3px 0;"><span style="background-color: {START_MARKER_COLOR}; border: 1px solid {END_MARKER_COLOR}; width: 10px; height: 10px; border-radius: 50%; margin-right: 8px;"></span><span>Start</span></div><div style="display: flex; align-items: center; margin: 3px 0;"><span style="background-color: {END_MARKER_COLOR}; width: 10px; height: 10px; border-radius: 50%; margin-right: 8px;"></span><span>End</span></div></div>"#
        );
    }

    format!(
        r#"var legend = L.control({{position: 'bottomleft'}});
legend.onAdd = function(map) {{
    var div = L.DomUtil.create('div', 'legend-control');
    div.innerHTML = `<div id="map-legend" style="padding: 10px 14px; background: white; border-radius: 5px; border: 2px solid rgba(0,0,0,0.2); font-family: Arial, sans-serif; font-size: 12px; line-height: 1.4;"><div style="font-weight: bold; margin-bottom: 5px;">Deployment Year</div>{rows}</div>`;
    return div;
}};
legend.addTo(map);
"#
    )
}

/// Leaflet has no built-in top-center control corner, so the title control
/// creates one before attaching itself.
fn build_title_js(title: &str) -> String {
    let title = html_escape(title);
    format!(
        r#"var corners = map._controlCorners;
if (!corners['topcenter']) {{
    corners['topcenter'] = L.DomUtil.create('div', 'leaflet-top leaflet-center', map._controlContainer);
    corners['topcenter'].style.left = '50%';
    corners['topcenter'].style.transform = 'translateX(-50%)';
    corners['topcenter'].style.marginTop = '10px';
}}
var titleControl = L.control({{position: 'topcenter'}});
titleControl.onAdd = function(map) {{
    var div = L.DomUtil.create('div', 'title-control');
    div.innerHTML = `<div id="map-title" style="padding: 12px 24px; background: rgba(255, 255, 255, 0.95); border-radius: 4px; border: 3px solid black; box-shadow: 0 2px 6px rgba(0, 0, 0, 0.15); font-family: 'Georgia', 'Times New Roman', serif; text-align: center;"><div style="font-size: 18px; font-weight: bold; color: #003366; letter-spacing: 0.5px;">{title}</div></div>`;
    return div;
}};
titleControl.addTo(map);
"#
    )
}

const SAVE_BUTTON_CSS: &str = r#".save-button {
    position: absolute;
    top: 10px;
    right: 10px;
    z-index: 1000;
    padding: 10px 20px;
    background-color: #4CAF50;
    color: white;
    border: none;
    border-radius: 5px;
    cursor: pointer;
    font-size: 14px;
    font-family: Arial, sans-serif;
}
.save-button:hover { background-color: #45a049; }
.save-button:disabled { background-color: #cccccc; cursor: wait; }"#;

const SAVE_BUTTON_JS: &str = r#"var mapContainer = document.getElementById('map');
var saveBtn = document.createElement('button');
saveBtn.className = 'save-button';
saveBtn.innerHTML = 'Save to PNG';
mapContainer.appendChild(saveBtn);
function resetSaveBtn() {
    saveBtn.style.display = 'block';
    saveBtn.disabled = false;
    saveBtn.innerHTML = 'Save to PNG';
}
saveBtn.onclick = function() {
    saveBtn.disabled = true;
    saveBtn.innerHTML = 'Generating...';
    saveBtn.style.display = 'none';
    setTimeout(function() {
        domtoimage.toPng(mapContainer, {quality: 1.0, bgcolor: '#fff'})
            .then(function(dataUrl) {
                var link = document.createElement('a');
                link.download = 'glider_deployment_map.png';
                link.href = dataUrl;
                link.click();
                resetSaveBtn();
            })
            .catch(function(e) {
                console.error('Error:', e);
                resetSaveBtn();
                alert('Error generating image. Try again.');
            });
    }, 500);
};
"#;

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '`' => escaped.push_str("&#96;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::WONG_PALETTE;
    use chrono::{DateTime, Utc};

    fn deployment(name: &str, year: i32, geometry: &str) -> Deployment {
        Deployment {
            name: name.to_string(),
            region: "caribbean".to_string(),
            year,
            start_time: "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            end_time: "2024-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            geometry: geometry.to_string(),
        }
    }

    const TWO_POINT: &str = "LINESTRING(-70.1 41.1, -70.2 41.2)";
    const ONE_POINT: &str = "LINESTRING(-70.5 41.5)";

    #[test]
    fn legend_rows_count_and_color_by_year() {
        let deployments = vec![
            deployment("bass", 2023, TWO_POINT),
            deployment("cod", 2023, TWO_POINT),
            deployment("tuna", 2024, TWO_POINT),
        ];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();

        assert!(html.contains("2023: 2"));
        assert!(html.contains("2024: 1"));
        assert!(html.contains("Total: 3"));
        assert!(html.contains(WONG_PALETTE[0]));
        assert!(html.contains(WONG_PALETTE[1]));
        // Only two years present, so the third palette color is never used.
        assert!(!html.contains(WONG_PALETTE[2]));
    }

    #[test]
    fn start_end_markers_are_drawn_after_every_track() {
        let deployments = vec![
            deployment("bass", 2023, TWO_POINT),
            deployment("tuna", 2024, TWO_POINT),
        ];
        let options = MapOptions {
            markers: true,
            ..MapOptions::default()
        };
        let html = compose_map(&deployments, &options).unwrap();

        let last_track = html.rfind("L.polyline").unwrap();
        let first_marker = html.find("L.circleMarker").unwrap();
        assert!(last_track < first_marker);
        assert!(html.contains("Start: bass"));
        assert!(html.contains("End: tuna"));
    }

    #[test]
    fn markers_off_leaves_overlays_and_marker_key_out() {
        let deployments = vec![deployment("bass", 2023, TWO_POINT)];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(!html.contains("Start: bass"));
        assert!(!html.contains(">Start<"));
    }

    #[test]
    fn title_control_is_optional() {
        let deployments = vec![deployment("bass", 2023, TWO_POINT)];

        let without = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(!without.contains("map-title"));

        let options = MapOptions {
            title: Some("Hurricane Gliders 2023".to_string()),
            ..MapOptions::default()
        };
        let with = compose_map(&deployments, &options).unwrap();
        assert!(with.contains("map-title"));
        assert!(with.contains("Hurricane Gliders 2023"));
    }

    #[test]
    fn legend_and_export_control_are_always_present() {
        let deployments = vec![deployment("bass", 2023, TWO_POINT)];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(html.contains("map-legend"));
        assert!(html.contains("Save to PNG"));
        assert!(html.contains("dom-to-image"));
    }

    #[test]
    fn empty_store_is_fatal() {
        assert!(matches!(
            compose_map(&[], &MapOptions::default()),
            Err(ComposeError::EmptyStore)
        ));
    }

    #[test]
    fn single_point_skip_policy_drops_the_track_but_not_its_legend_count() {
        let deployments = vec![
            deployment("bass", 2023, TWO_POINT),
            deployment("lonely", 2023, ONE_POINT),
        ];
        let options = MapOptions {
            single_point: SinglePointPolicy::Skip,
            ..MapOptions::default()
        };
        let html = compose_map(&deployments, &options).unwrap();
        assert!(!html.contains("lonely"));
        // Legend counts stored deployments, drawn or not.
        assert!(html.contains("2023: 2"));
    }

    #[test]
    fn single_point_marker_policy_draws_a_point_in_year_color() {
        let deployments = vec![deployment("lonely", 2023, ONE_POINT)];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(html.contains("L.circleMarker([41.5, -70.5]"));
        assert!(html.contains(WONG_PALETTE[0]));
    }

    #[test]
    fn all_tracks_skipped_is_fatal() {
        let deployments = vec![deployment("lonely", 2023, ONE_POINT)];
        let options = MapOptions {
            single_point: SinglePointPolicy::Skip,
            ..MapOptions::default()
        };
        assert!(matches!(
            compose_map(&deployments, &options),
            Err(ComposeError::NoDrawableGeometry)
        ));
    }

    #[test]
    fn tooltip_text_is_escaped() {
        let deployments = vec![deployment("<script>alert(1)</script>", 2023, TWO_POINT)];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert"));
    }

    #[test]
    fn fit_bounds_covers_every_track() {
        let deployments = vec![
            deployment("bass", 2023, "LINESTRING(-80 20, -70 30)"),
            deployment("tuna", 2024, "LINESTRING(-60 25, -65 35)"),
        ];
        let html = compose_map(&deployments, &MapOptions::default()).unwrap();
        assert!(html.contains("map.fitBounds([[20, -80], [35, -60]]);"));
    }
}
