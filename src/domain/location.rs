use thiserror::Error;

/// Reasons a coordinate/label triple cannot become a [`ResolvedLocation`]
#[derive(Debug, Error, PartialEq)]
pub enum LocationError {
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("label is empty")]
    EmptyLabel,
}

/// Check a (lat, lon) pair lies within WGS84 bounds
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), LocationError> {
    // NaN fails both range checks
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(LocationError::LatitudeOutOfRange(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(LocationError::LongitudeOutOfRange(longitude));
    }
    Ok(())
}

/// A geocoded place: WGS84 coordinates plus the provider's display name.
///
/// Fields are private so a value can only be built through [`ResolvedLocation::new`],
/// which enforces coordinate ranges and a non-empty label.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    latitude: f64,
    longitude: f64,
    label: String,
}

impl ResolvedLocation {
    pub fn new(
        latitude: f64,
        longitude: f64,
        label: impl Into<String>,
    ) -> Result<Self, LocationError> {
        let label = label.into();

        check_coordinates(latitude, longitude)?;
        if label.trim().is_empty() {
            return Err(LocationError::EmptyLabel);
        }

        Ok(Self {
            latitude,
            longitude,
            label,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// (lat, lon) pair
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Short marker label: the display name up to its first comma
    pub fn tooltip(&self) -> &str {
        self.label.split(',').next().unwrap_or_default().trim()
    }
}
