//! Event-driven session behind the `map` command.
//!
//! Each user action becomes a [`DashboardEvent`] handled by [`Dashboard::dispatch`];
//! rendering reads the resulting state through [`Dashboard::view`].

use tracing::{debug, info};

use crate::api::Geocode;
use crate::domain::LocationCollection;
use crate::present::{LocationTable, MapPresenter, MapView, Render};

pub const MISSING_KEY_MESSAGE: &str = "Please enter your LocationIQ API key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No locations resolved yet, or cleared
    Idle,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    SetApiKey(String),
    Search(String),
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Warning(String),
    Error(String),
}

/// Snapshot of what the dashboard shows after the last event
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub banner: Option<Banner>,
    pub table: LocationTable,
    pub map: MapView,
}

pub struct Dashboard<G: Geocode> {
    geocoder: G,
    api_key: Option<String>,
    locations: LocationCollection,
    map: MapPresenter,
    banner: Option<Banner>,
}

impl<G: Geocode> Dashboard<G> {
    pub fn new(geocoder: G) -> Self {
        Self {
            geocoder,
            api_key: None,
            locations: LocationCollection::new(),
            map: MapPresenter::default(),
            banner: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.set_api_key(api_key.into());
        self
    }

    pub fn with_center(mut self, center: Option<(f64, f64)>) -> Self {
        self.map.center = center;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.map.zoom = zoom;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.locations.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Populated
        }
    }

    pub fn locations(&self) -> &LocationCollection {
        &self.locations
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Apply one user action and return the state it leaves the session in
    pub fn dispatch(&mut self, event: DashboardEvent) -> SessionState {
        match event {
            DashboardEvent::SetApiKey(key) => {
                self.set_api_key(key);
                self.banner = None;
            }
            DashboardEvent::Search(query) => self.search(&query),
            DashboardEvent::Clear => {
                debug!(cleared = self.locations.len(), "Clearing locations");
                self.locations.clear();
                self.banner = None;
            }
        }
        self.state()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            banner: self.banner.clone(),
            table: LocationTable::from_locations(&self.locations),
            map: self.map.view(&self.locations),
        }
    }

    /// HTML page for the current map
    pub fn render_map(&self) -> String {
        self.map.render(&self.locations)
    }

    fn set_api_key(&mut self, key: String) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    fn search(&mut self, query: &str) {
        if query.trim().is_empty() {
            return;
        }

        let Some(api_key) = self.api_key.as_deref() else {
            self.banner = Some(Banner::Warning(MISSING_KEY_MESSAGE.to_string()));
            return;
        };

        match self.geocoder.resolve(query, api_key) {
            Ok(location) => {
                info!(label = location.label(), "Resolved location");
                self.locations.append(location);
                self.banner = None;
            }
            Err(e) => {
                debug!(error = %e, "Search failed");
                self.banner = Some(Banner::Error(format!("Error processing location: {}", e)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GeocodeError;
    use crate::domain::ResolvedLocation;
    use std::cell::RefCell;

    /// Answers from a fixed table and records the keys it was called with
    #[derive(Default)]
    struct StubGeocoder {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl Geocode for StubGeocoder {
        fn resolve(&self, query: &str, api_key: &str) -> Result<ResolvedLocation, GeocodeError> {
            self.calls
                .borrow_mut()
                .push((query.to_string(), api_key.to_string()));
            match query {
                "Paris" => Ok(ResolvedLocation::new(48.8566, 2.3522, "Paris, France")?),
                "Tokyo" => Ok(ResolvedLocation::new(35.6762, 139.6503, "Tokyo, Japan")?),
                "down" => Err(GeocodeError::HttpStatus {
                    status: 503,
                    message: "Service Unavailable".to_string(),
                }),
                other => Err(GeocodeError::EmptyResult(other.to_string())),
            }
        }
    }

    fn dashboard() -> Dashboard<StubGeocoder> {
        Dashboard::new(StubGeocoder::default()).with_api_key("pk.test")
    }

    #[test]
    fn test_starts_idle_with_default_map() {
        let dash = dashboard();
        let view = dash.view();

        assert_eq!(dash.state(), SessionState::Idle);
        assert!(view.table.is_empty());
        assert!(view.map.markers.is_empty());
        assert_eq!(view.map.center, (40.7128, -74.0060));
        assert_eq!(view.banner, None);
    }

    #[test]
    fn test_search_transitions() {
        let mut dash = dashboard();

        assert_eq!(
            dash.dispatch(DashboardEvent::Search("Paris".into())),
            SessionState::Populated
        );
        assert_eq!(
            dash.dispatch(DashboardEvent::Search("Tokyo".into())),
            SessionState::Populated
        );

        let view = dash.view();
        assert_eq!(view.table.rows().len(), 2);
        assert_eq!(view.map.markers.len(), 2);
        assert_eq!(view.map.center, (48.8566, 2.3522));
        assert_eq!(dash.locations().last().unwrap().label(), "Tokyo, Japan");
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut dash = dashboard();
        dash.dispatch(DashboardEvent::Search("Paris".into()));

        assert_eq!(dash.dispatch(DashboardEvent::Clear), SessionState::Idle);
        assert!(dash.locations().is_empty());
        assert_eq!(dash.view().map.center, (40.7128, -74.0060));
    }

    #[test]
    fn test_failed_search_leaves_collection_unchanged() {
        let mut dash = dashboard();
        dash.dispatch(DashboardEvent::Search("Paris".into()));
        let before = dash.locations().clone();

        let state = dash.dispatch(DashboardEvent::Search("asdkfjasdkf".into()));

        assert_eq!(state, SessionState::Populated);
        assert_eq!(dash.locations(), &before);
        assert!(matches!(dash.view().banner, Some(Banner::Error(_))));

        dash.dispatch(DashboardEvent::Search("down".into()));
        assert_eq!(dash.locations(), &before);
    }

    #[test]
    fn test_failed_search_while_idle_stays_idle() {
        let mut dash = dashboard();
        assert_eq!(
            dash.dispatch(DashboardEvent::Search("asdkfjasdkf".into())),
            SessionState::Idle
        );
    }

    #[test]
    fn test_successful_search_clears_banner() {
        let mut dash = dashboard();
        dash.dispatch(DashboardEvent::Search("nowhere".into()));
        assert!(dash.view().banner.is_some());

        dash.dispatch(DashboardEvent::Search("Paris".into()));
        assert_eq!(dash.view().banner, None);
    }

    #[test]
    fn test_search_without_key_warns_and_skips_lookup() {
        let mut dash = Dashboard::new(StubGeocoder::default());
        assert!(!dash.has_api_key());

        let state = dash.dispatch(DashboardEvent::Search("Paris".into()));

        assert_eq!(state, SessionState::Idle);
        assert_eq!(
            dash.view().banner,
            Some(Banner::Warning(MISSING_KEY_MESSAGE.to_string()))
        );
        assert!(dash.geocoder.calls.borrow().is_empty());
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let mut dash = dashboard();
        dash.dispatch(DashboardEvent::Search("   ".into()));

        assert!(dash.geocoder.calls.borrow().is_empty());
        assert_eq!(dash.view().banner, None);
    }

    #[test]
    fn test_set_api_key_is_used_for_lookups() {
        let mut dash = Dashboard::new(StubGeocoder::default());
        dash.dispatch(DashboardEvent::SetApiKey("  pk.later  ".into()));
        dash.dispatch(DashboardEvent::Search("Paris".into()));

        assert_eq!(
            dash.geocoder.calls.borrow().as_slice(),
            &[("Paris".to_string(), "pk.later".to_string())]
        );

        dash.dispatch(DashboardEvent::SetApiKey(String::new()));
        assert!(!dash.has_api_key());
    }

    #[test]
    fn test_center_override_and_zoom() {
        let mut dash = dashboard().with_center(Some((1.5, 2.5))).with_zoom(9);
        dash.dispatch(DashboardEvent::Search("Paris".into()));

        let map = dash.view().map;
        assert_eq!(map.center, (1.5, 2.5));
        assert_eq!(map.zoom, 9);
    }

    #[test]
    fn test_render_map_reflects_locations() {
        let mut dash = dashboard();
        dash.dispatch(DashboardEvent::Search("Tokyo".into()));

        let html = dash.render_map();
        assert!(html.contains(r#""popup":"Tokyo, Japan""#));
    }
}
