use crate::timeclock::Coordinates;
use anyhow::Result;

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<Coordinates> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(anyhow::anyhow!(
            "Latitude must be between -90 and 90 (got {})",
            latitude
        ));
    }

    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(anyhow::anyhow!(
            "Longitude must be between -180 and 180 (got {})",
            longitude
        ));
    }

    Ok(Coordinates { latitude, longitude })
}

/// Optional command arguments: both given, or neither.
pub fn validate_optional_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinates>> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => validate_coordinates(lat, lon).map(Some),
        (None, None) => Ok(None),
        _ => Err(anyhow::anyhow!(
            "Provide both latitude and longitude, or neither"
        )),
    }
}
