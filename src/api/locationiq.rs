use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{LocationError, ResolvedLocation};

pub const DEFAULT_ENDPOINT: &str = "https://us1.locationiq.com/v1/search.php";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("locmap/", env!("CARGO_PKG_VERSION"));

/// Error body LocationIQ sends with a 404 when nothing matched
const NO_MATCH_MESSAGE: &str = "Unable to geocode";

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("query must not be empty")]
    InvalidQuery,

    #[error("no results found for \"{0}\"")]
    EmptyResult(String),

    #[error("unexpected response from LocationIQ: {0}")]
    MalformedResponse(String),

    #[error("failed to reach LocationIQ: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LocationIQ returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },
}

impl GeocodeError {
    /// Network, timeout or non-2xx failures
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::HttpStatus { .. })
    }

    /// The query itself was the problem: nothing to look up, or nothing found
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::InvalidQuery | Self::EmptyResult(_))
    }
}

impl From<LocationError> for GeocodeError {
    fn from(err: LocationError) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}

/// Anything that can turn a free-text address into a [`ResolvedLocation`].
pub trait Geocode {
    fn resolve(&self, query: &str, api_key: &str) -> Result<ResolvedLocation, GeocodeError>;
}

/// LocationIQ sends coordinates as strings, but numbers are accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn parse(&self, field: &str) -> Result<f64, GeocodeError> {
        match self {
            Coordinate::Number(value) => Ok(*value),
            Coordinate::Text(text) => text.trim().parse().map_err(|_| {
                GeocodeError::MalformedResponse(format!("{} is not a number: {:?}", field, text))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationIqResult {
    lat: Coordinate,
    lon: Coordinate,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct LocationIqErrorBody {
    error: String,
}

/// Blocking client for the LocationIQ forward geocoding endpoint.
///
/// Each [`Geocode::resolve`] call is a single GET with no retries or caching.
#[derive(Debug, Clone)]
pub struct LocationIq {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl LocationIq {
    /// Build a client for `endpoint` (e.g. [`DEFAULT_ENDPOINT`]).
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the `search.php` endpoint
    /// * `timeout` - Whole-request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Geocode for LocationIq {
    /// Geocode `query` and return the first match.
    ///
    /// # Returns
    /// * `Ok(ResolvedLocation)` - Built from the first array element
    /// * `Err(EmptyResult)` - Empty array, or LocationIQ's 404 "Unable to geocode"
    /// * `Err(MalformedResponse)` - Body is not an array of places
    /// * `Err(Transport | HttpStatus)` - Network failure, timeout or other non-2xx status
    fn resolve(&self, query: &str, api_key: &str) -> Result<ResolvedLocation, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::InvalidQuery);
        }

        debug!(query, endpoint = %self.endpoint, "Sending geocode request");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", api_key), ("q", query), ("format", "json")])
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = serde_json::from_str::<LocationIqErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());

            if status == StatusCode::NOT_FOUND && message == NO_MATCH_MESSAGE {
                debug!(query, "LocationIQ found no match");
                return Err(GeocodeError::EmptyResult(query.to_string()));
            }

            warn!(status = status.as_u16(), %message, "LocationIQ request failed");
            return Err(GeocodeError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        parse_first_result(query, &body)
    }
}

/// Parse a LocationIQ search body and keep only the first place
fn parse_first_result(query: &str, body: &str) -> Result<ResolvedLocation, GeocodeError> {
    let results: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::MalformedResponse(format!("expected a JSON array: {}", e)))?;

    let first = results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::EmptyResult(query.to_string()))?;

    let result: LocationIqResult = serde_json::from_value(first)
        .map_err(|e| GeocodeError::MalformedResponse(e.to_string()))?;

    let lat = result.lat.parse("lat")?;
    let lon = result.lon.parse("lon")?;

    Ok(ResolvedLocation::new(lat, lon, result.display_name)?)
}
