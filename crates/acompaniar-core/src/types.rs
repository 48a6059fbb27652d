use crate::constants::ADDRESS_MAX_CHARS;
use crate::error::{CoreError, CoreResult};

/// A validated point attached to an alert.
///
/// Coordinates are bounded to their valid ranges and rounded to six decimal
/// places on construction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// ## Summary
    /// Builds a location from an address and a pair of coordinates.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the address is empty or too long, or if a
    /// coordinate is not finite or out of range.
    pub fn new(address: &str, latitude: f64, longitude: f64) -> CoreResult<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CoreError::ValidationError(
                "La dirección no puede estar vacía".to_string(),
            ));
        }
        if address.chars().count() > ADDRESS_MAX_CHARS {
            return Err(CoreError::ValidationError(format!(
                "La dirección no puede superar {ADDRESS_MAX_CHARS} caracteres"
            )));
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(CoreError::ValidationError(
                "Latitud fuera de rango".to_string(),
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(CoreError::ValidationError(
                "Longitud fuera de rango".to_string(),
            ));
        }

        Ok(Self {
            address: address.to_string(),
            latitude: round6(latitude),
            longitude: round6(longitude),
        })
    }

    /// ## Summary
    /// Returns a map link centered on this point.
    #[must_use]
    pub fn maps_url(&self) -> String {
        format!(
            "https://maps.google.com/?q={},{}",
            self.latitude, self.longitude
        )
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}
