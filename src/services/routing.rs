use crate::error::Result;
use crate::models::{Coordinates, TransportMode};
use async_trait::async_trait;
use serde::Serialize;

/// A turn-by-turn routing backend. The generator only ever sees this trait,
/// so tests can swap in a deterministic simulator.
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    /// Route through `points` in order. The first and last points are the
    /// route endpoints; for loops they are the same point.
    async fn compute_route(&self, points: &[Coordinates], mode: &TransportMode)
        -> Result<RoutedPath>;

    fn engine_name(&self) -> &'static str;
}

/// What a routing engine measured for one ordered point list.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedPath {
    pub polyline: Vec<Coordinates>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RoutedPath {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.duration_seconds / 60.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routed_path_conversions() {
        let path = RoutedPath {
            polyline: vec![],
            distance_meters: 5240.0,
            duration_seconds: 3720.0,
        };
        assert_eq!(path.distance_km(), 5.24);
        assert_eq!(path.duration_minutes(), 62);
    }
}
