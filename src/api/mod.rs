pub mod locationiq;

pub use locationiq::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, Geocode, GeocodeError, LocationIq};
