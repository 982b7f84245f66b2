//! Planar and great-circle helpers shared by the generator components.
//!
//! Distances are in meters. Projections use an equirectangular approximation,
//! which stays well under 1% error for the city-scale radii (≤50 km) used here.

use crate::models::Coordinates;
use std::f64::consts::TAU;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance in meters.
pub fn distance_m(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1_rad = a.lat.to_radians();
    let lat2_rad = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Displace `center` by `radius_m` along `bearing_rad` (clockwise from north).
/// Latitude is clamped to the poles and longitude wrapped into [-180, 180].
pub fn project(center: &Coordinates, bearing_rad: f64, radius_m: f64) -> Coordinates {
    let angular = radius_m / EARTH_RADIUS_M;
    let dlat = angular * bearing_rad.cos();
    let cos_lat = center.lat.to_radians().cos().max(1e-6);
    let dlng = angular * bearing_rad.sin() / cos_lat;

    let lat = (center.lat + dlat.to_degrees()).clamp(-90.0, 90.0);
    let mut lng = center.lng + dlng.to_degrees();
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }

    Coordinates { lat, lng }
}

/// Local east/north offsets in meters of `point` relative to `origin`.
fn local_xy(origin: &Coordinates, point: &Coordinates) -> (f64, f64) {
    let meters_per_deg = EARTH_RADIUS_M.to_radians();
    let x = (point.lng - origin.lng) * meters_per_deg * origin.lat.to_radians().cos();
    let y = (point.lat - origin.lat) * meters_per_deg;
    (x, y)
}

/// Scalar projection of `point` onto `start → end`, clamped to [0, 1].
/// A degenerate segment yields 0.
pub fn progression(start: &Coordinates, end: &Coordinates, point: &Coordinates) -> f64 {
    let (sx, sy) = local_xy(start, end);
    let len_sq = sx * sx + sy * sy;
    if len_sq < 1e-9 {
        return 0.0;
    }
    let (px, py) = local_xy(start, point);
    ((px * sx + py * sy) / len_sq).clamp(0.0, 1.0)
}

/// Approximate distance in meters from `point` to the segment `seg_start → seg_end`.
pub fn point_to_segment_distance_m(
    point: &Coordinates,
    seg_start: &Coordinates,
    seg_end: &Coordinates,
) -> f64 {
    let t = progression(seg_start, seg_end, point);
    let closest = Coordinates {
        lat: seg_start.lat + t * (seg_end.lat - seg_start.lat),
        lng: seg_start.lng + t * (seg_end.lng - seg_start.lng),
    };
    distance_m(point, &closest)
}

/// Arithmetic mean of the points in degree space.
pub fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(Coordinates {
        lat: lat / n,
        lng: lng / n,
    })
}

/// Bearing from `from` to `to`, clockwise from north, in [0, 2π).
pub fn bearing_rad(from: &Coordinates, to: &Coordinates) -> f64 {
    let (x, y) = local_xy(from, to);
    x.atan2(y).rem_euclid(TAU)
}

/// Sum of consecutive haversine distances in meters.
pub fn path_length_m(path: &[Coordinates]) -> f64 {
    path.windows(2).map(|w| distance_m(&w[0], &w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn distance_of_one_degree_latitude() {
        let d = distance_m(&c(0.0, 0.0), &c(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = c(48.8566, 2.3522);
        let b = c(48.8606, 2.3376);
        assert!((distance_m(&a, &b) - distance_m(&b, &a)).abs() < 1e-9);
        assert_eq!(distance_m(&a, &a), 0.0);
    }

    #[test]
    fn project_then_measure_matches_radius() {
        let center = c(48.8566, 2.3522);
        for bearing in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, 0.7] {
            let p = project(&center, bearing, 2_000.0);
            let d = distance_m(&center, &p);
            assert!((d - 2_000.0).abs() < 20.0, "bearing {bearing}: {d}");
        }
    }

    #[test]
    fn project_north_increases_latitude() {
        let center = c(10.0, 10.0);
        let north = project(&center, 0.0, 1_000.0);
        assert!(north.lat > center.lat);
        assert!((north.lng - center.lng).abs() < 1e-9);
        let east = project(&center, FRAC_PI_2, 1_000.0);
        assert!(east.lng > center.lng);
    }

    #[test]
    fn project_wraps_antimeridian() {
        let p = project(&c(0.0, 179.999), FRAC_PI_2, 5_000.0);
        assert!(p.lng < -179.0, "got {}", p.lng);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn progression_is_clamped() {
        let start = c(48.85, 2.30);
        let end = c(48.85, 2.40);
        assert_eq!(progression(&start, &end, &c(48.85, 2.20)), 0.0);
        assert_eq!(progression(&start, &end, &c(48.85, 2.50)), 1.0);
        let mid = progression(&start, &end, &c(48.86, 2.35));
        assert!((mid - 0.5).abs() < 0.01, "got {mid}");
    }

    #[test]
    fn progression_degenerate_segment() {
        let p = c(48.85, 2.30);
        assert_eq!(progression(&p, &p, &c(48.9, 2.4)), 0.0);
    }

    #[test]
    fn point_to_segment_distance_perpendicular() {
        let start = c(0.0, 0.0);
        let end = c(0.0, 1.0);
        let d = point_to_segment_distance_m(&c(0.01, 0.5), &start, &end);
        assert!((d - 1_112.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn centroid_of_square() {
        let pts = [c(0.0, 0.0), c(0.0, 2.0), c(2.0, 2.0), c(2.0, 0.0)];
        let ctr = centroid(&pts).unwrap();
        assert!((ctr.lat - 1.0).abs() < 1e-12 && (ctr.lng - 1.0).abs() < 1e-12);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn bearing_cardinal_directions() {
        let o = c(45.0, 7.0);
        assert!(bearing_rad(&o, &c(45.1, 7.0)).abs() < 1e-6);
        assert!((bearing_rad(&o, &c(45.0, 7.1)) - FRAC_PI_2).abs() < 1e-6);
        assert!((bearing_rad(&o, &c(44.9, 7.0)) - PI).abs() < 1e-6);
        assert!((bearing_rad(&o, &c(45.0, 6.9)) - 3.0 * FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn path_length_sums_segments() {
        let a = c(0.0, 0.0);
        let b = c(0.0, 0.01);
        let path = [a, b, a];
        assert!((path_length_m(&path) - 2.0 * distance_m(&a, &b)).abs() < 1e-9);
        assert_eq!(path_length_m(&[a]), 0.0);
    }
}
