use serde_json::json;

use super::Render;
use crate::domain::LocationCollection;

/// New York City, used when nothing else decides where the map looks
pub const DEFAULT_CENTER: (f64, f64) = (40.7128, -74.0060);
pub const DEFAULT_ZOOM: u8 = 13;
/// Highest zoom OpenStreetMap tiles are served at
pub const MAX_ZOOM: u8 = 19;

const LEAFLET_VERSION: &str = "1.9.4";

/// Pick the map center.
///
/// An explicit override wins, then the first resolved location, then [`DEFAULT_CENTER`].
pub fn choose_center(center: Option<(f64, f64)>, locations: &LocationCollection) -> (f64, f64) {
    center
        .or_else(|| locations.first().map(|loc| loc.coordinates()))
        .unwrap_or(DEFAULT_CENTER)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    /// Full display name
    pub popup: String,
    pub tooltip: String,
}

/// Everything needed to draw the map: where to look and what to pin
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapView {
    pub fn build(locations: &LocationCollection, center: Option<(f64, f64)>, zoom: u8) -> Self {
        let markers = locations
            .all()
            .iter()
            .map(|loc| Marker {
                lat: loc.latitude(),
                lon: loc.longitude(),
                popup: loc.label().to_string(),
                tooltip: loc.tooltip().to_string(),
            })
            .collect();

        Self {
            center: choose_center(center, locations),
            zoom,
            markers,
        }
    }

    /// Standalone HTML page drawing this view with Leaflet and OpenStreetMap tiles
    pub fn to_html(&self) -> String {
        let markers: Vec<_> = self
            .markers
            .iter()
            .map(|m| {
                json!({
                    "lat": m.lat,
                    "lon": m.lon,
                    "popup": m.popup,
                    "tooltip": m.tooltip,
                })
            })
            .collect();

        let data = json!({
            "center": [self.center.0, self.center.1],
            "zoom": self.zoom,
            "markers": markers,
        });

        // Keep labels from closing the script element early
        let data = data.to_string().replace("</", "<\\/");

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>locmap</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<link rel="stylesheet" href="https://unpkg.com/leaflet@{version}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{version}/dist/leaflet.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const data = {data};
const map = L.map("map").setView(data.center, data.zoom);
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  maxZoom: {max_zoom},
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
for (const m of data.markers) {{
  L.marker([m.lat, m.lon]).bindPopup(m.popup).bindTooltip(m.tooltip).addTo(map);
}}
</script>
</body>
</html>
"#,
            version = LEAFLET_VERSION,
            max_zoom = MAX_ZOOM,
            data = data,
        )
    }
}

/// The map half of the dashboard, rendered as an HTML page
#[derive(Debug, Clone, Copy)]
pub struct MapPresenter {
    pub center: Option<(f64, f64)>,
    pub zoom: u8,
}

impl Default for MapPresenter {
    fn default() -> Self {
        Self {
            center: None,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapPresenter {
    pub fn view(&self, locations: &LocationCollection) -> MapView {
        MapView::build(locations, self.center, self.zoom)
    }
}

impl Render for MapPresenter {
    fn render(&self, locations: &LocationCollection) -> String {
        self.view(locations).to_html()
    }
}
