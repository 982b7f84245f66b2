use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// A WGS84 point in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let point = Coordinates { lat, lng };
        point.validate()?;
        Ok(point)
    }

    /// Check a point that may have bypassed `new` (e.g. deserialized from a request body).
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(AppError::InvalidPoint(format!(
                "Coordinates must be finite numbers, got ({}, {})",
                self.lat, self.lng
            )));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::InvalidPoint(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::InvalidPoint(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                self.lng
            )));
        }
        Ok(())
    }

    /// Calculate distance between two coordinates using Haversine formula
    /// Returns distance in kilometers
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        crate::services::route_generator::geometry::distance_m(self, other) / 1000.0
    }

    /// Round coordinates to specified decimal places for caching
    pub fn round(&self, decimal_places: u32) -> Self {
        let multiplier = 10_f64.powi(decimal_places as i32);
        Coordinates {
            lat: (self.lat * multiplier).round() / multiplier,
            lng: (self.lng * multiplier).round() / multiplier,
        }
    }

    /// Midpoint in degree space. Adequate for the city-scale segments routed here.
    pub fn midpoint(&self, other: &Coordinates) -> Coordinates {
        Coordinates {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(48.8566, 2.3522).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err()); // Invalid lat
        assert!(Coordinates::new(0.0, 181.0).is_err()); // Invalid lng
    }

    #[test]
    fn test_nan_is_invalid_point() {
        let err = Coordinates::new(f64::NAN, 2.0).unwrap_err();
        assert!(matches!(err, AppError::InvalidPoint(_)));

        let deserialized = Coordinates {
            lat: 48.0,
            lng: f64::INFINITY,
        };
        assert!(matches!(
            deserialized.validate(),
            Err(AppError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_distance_calculation() {
        let paris = Coordinates::new(48.8566, 2.3522).unwrap();
        let london = Coordinates::new(51.5074, -0.1278).unwrap();

        let distance = paris.distance_to(&london);
        // Paris to London is approximately 344 km
        assert!((distance - 344.0).abs() < 10.0);
    }

    #[test]
    fn test_rounding() {
        let coords = Coordinates::new(48.856614, 2.352222).unwrap();
        let rounded = coords.round(3);
        assert_eq!(rounded.lat, 48.857);
        assert_eq!(rounded.lng, 2.352);
    }

    #[test]
    fn test_midpoint() {
        let a = Coordinates::new(48.0, 2.0).unwrap();
        let b = Coordinates::new(49.0, 3.0).unwrap();
        let mid = a.midpoint(&b);
        assert!((mid.lat - 48.5).abs() < 1e-12);
        assert!((mid.lng - 2.5).abs() < 1e-12);
    }
}
