use crate::models::Coordinates;

/// Axis-aligned bounding box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Compute a bounding box around a center point with a radius in meters.
    pub fn from_center_radius(center: &Coordinates, radius_m: f64) -> Self {
        let lat_delta = radius_m / 111_000.0;
        let lng_delta = if center.lat.abs() > 85.0 {
            lat_delta
        } else {
            radius_m / (111_000.0 * center.lat.to_radians().cos())
        };

        BoundingBox {
            min_lat: (center.lat - lat_delta).max(-90.0),
            max_lat: (center.lat + lat_delta).min(90.0),
            min_lng: (center.lng - lng_delta).max(-180.0),
            max_lng: (center.lng + lng_delta).min(180.0),
        }
    }

    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    /// Nominatim `viewbox` parameter: `x1,y1,x2,y2` as `lng,lat,lng,lat`.
    pub fn to_viewbox(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lng, self.max_lat, self.max_lng, self.min_lat
        )
    }
}
