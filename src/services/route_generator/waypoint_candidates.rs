//! Geometric candidate waypoints around a center.
//!
//! Candidates sit at evenly spaced bearings, each nudged by a bounded random
//! angle and placed at `base radius × radius factor × variation`, capped at
//! the mode's maximum radius. The distance search only moves the radius
//! factor; with a fixed RNG seed the shape stays the same and just scales.

use super::geometry;
use crate::config::RouteGeneratorConfig;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, TransportMode};
use rand::Rng;
use std::f64::consts::TAU;

/// How many candidates to place for a target: more for longer targets and
/// for cycling, within per-mode caps.
pub fn waypoint_count(target_km: f64, mode: &TransportMode) -> usize {
    let base = CANDIDATE_COUNT_BRACKETS
        .iter()
        .find(|(max_km, _)| target_km <= *max_km)
        .map_or(CANDIDATE_COUNT_LONG, |(_, count)| *count);

    if mode.is_cycling() {
        (base + 1).min(CANDIDATE_CAP_CYCLING)
    } else {
        base.min(CANDIDATE_CAP_WALKING)
    }
}

/// Generate candidates around `center` for a `target_km` route.
///
/// Fails with `InsufficientCandidates` when fewer than the configured
/// minimum survive, instead of handing back a degenerate loop.
pub fn generate_candidates<R: Rng>(
    center: &Coordinates,
    target_km: f64,
    mode: &TransportMode,
    radius_factor: f64,
    rng: &mut R,
    config: &RouteGeneratorConfig,
) -> Result<Vec<Coordinates>> {
    let count = waypoint_count(target_km, mode);
    let radius = config.search_radius.for_mode(mode);
    let base_radius_km = radius.base_radius_km(target_km);
    let max_radius_km = radius.max_radius_km(target_km);

    // Very long targets get less angular jitter and a tighter, inward-biased
    // radius range so the loop does not fold over itself.
    let (jitter_scale, variation) = if target_km > VERY_LONG_ROUTE_KM {
        (VERY_LONG_ROUTE_KM / target_km, config.long_radius_variation)
    } else {
        (1.0, config.radius_variation)
    };

    let step = TAU / count as f64;
    let max_jitter = step * config.angle_jitter_fraction * jitter_scale;

    let mut candidates: Vec<Coordinates> = Vec::with_capacity(count);
    for i in 0..count {
        let jitter = rng.random_range(-max_jitter..=max_jitter);
        let bearing = (step * i as f64 + jitter).rem_euclid(TAU);
        let variation_factor = rng.random_range(variation.min..=variation.max);
        let radius_km = (base_radius_km * radius_factor * variation_factor).min(max_radius_km);

        let point = geometry::project(center, bearing, radius_km * 1000.0);

        let collapsed = geometry::distance_m(center, &point) < MIN_CANDIDATE_SEPARATION_M
            || candidates
                .iter()
                .any(|c| geometry::distance_m(c, &point) < MIN_CANDIDATE_SEPARATION_M);
        if point.validate().is_err() || collapsed {
            tracing::debug!(
                index = i,
                lat = point.lat,
                lng = point.lng,
                "Dropping candidate {} at ({:.5}, {:.5})",
                i, point.lat, point.lng
            );
            continue;
        }
        candidates.push(point);
    }

    if candidates.len() < config.min_candidate_waypoints {
        return Err(AppError::InsufficientCandidates {
            generated: candidates.len(),
            required: config.min_candidate_waypoints,
        });
    }

    tracing::debug!(
        count = candidates.len(),
        base_radius_km = %format!("{:.2}", base_radius_km),
        radius_factor = %format!("{:.3}", radius_factor),
        "Generated {} candidates (base radius {:.2}km, factor {:.3})",
        candidates.len(), base_radius_km, radius_factor
    );

    Ok(candidates)
}
