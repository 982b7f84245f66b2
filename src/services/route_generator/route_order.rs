//! Visiting order for intermediate points.
//!
//! Both orderings only permute their input. Loops use nearest-neighbour
//! construction followed by first-improvement position swaps; this finds a
//! good tour, not the optimal one. Point-to-point routes bucket points into
//! thirds along the start→end axis so the route never doubles back between
//! zones.

use super::geometry;
use crate::models::Coordinates;
use std::cmp::Ordering;

/// Improvements smaller than this (meters) are float noise, not progress.
const IMPROVEMENT_EPSILON_M: f64 = 1e-6;

/// Closed tour length: start → points… → start.
pub fn loop_length_m(start: &Coordinates, points: &[Coordinates]) -> f64 {
    let mut tour = Vec::with_capacity(points.len() + 2);
    tour.push(*start);
    tour.extend_from_slice(points);
    tour.push(*start);
    geometry::path_length_m(&tour)
}

/// Loop visiting order as indices into `points`. Never longer than visiting
/// `points` in the order given.
pub fn loop_order(start: &Coordinates, points: &[Coordinates], max_iterations: usize) -> Vec<usize> {
    let identity: Vec<usize> = (0..points.len()).collect();
    if points.len() < 2 {
        return identity;
    }

    let mut order = nearest_neighbour(start, points);
    refine_with_swaps(start, points, &mut order, max_iterations);

    let ordered: Vec<Coordinates> = order.iter().map(|&i| points[i]).collect();
    if loop_length_m(start, &ordered) > loop_length_m(start, points) {
        return identity;
    }
    order
}

pub fn optimize_loop(
    start: &Coordinates,
    points: &[Coordinates],
    max_iterations: usize,
) -> Vec<Coordinates> {
    loop_order(start, points, max_iterations)
        .into_iter()
        .map(|i| points[i])
        .collect()
}

/// Greedy tour from `start`. Ties go to the lower original index.
fn nearest_neighbour(start: &Coordinates, points: &[Coordinates]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut current = *start;

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &idx) in remaining.iter().enumerate() {
            let d = geometry::distance_m(&current, &points[idx]);
            if d < best_dist {
                best_dist = d;
                best_pos = pos;
            }
        }
        let idx = remaining.remove(best_pos);
        current = points[idx];
        order.push(idx);
    }

    order
}

/// Swap pairs of non-adjacent tour positions while that shortens the tour.
/// Each sweep commits the first improving swap and starts over; at most
/// `max_iterations` sweeps run.
fn refine_with_swaps(
    start: &Coordinates,
    points: &[Coordinates],
    order: &mut [usize],
    max_iterations: usize,
) {
    // Tour positions: 0 = start, 1..=n = order, n + 1 = start again.
    let n = order.len();
    let at = |order: &[usize], pos: usize| -> Coordinates {
        if pos == 0 || pos == n + 1 {
            *start
        } else {
            points[order[pos - 1]]
        }
    };
    let edge = |order: &[usize], a: usize, b: usize| geometry::distance_m(&at(order, a), &at(order, b));
    let touched = |order: &[usize], i: usize, j: usize| {
        edge(order, i - 1, i) + edge(order, i, i + 1) + edge(order, j - 1, j) + edge(order, j, j + 1)
    };

    for sweep in 0..max_iterations {
        let mut improved = false;

        'scan: for i in 1..=n {
            for j in (i + 2)..=n {
                let before = touched(order, i, j);
                order.swap(i - 1, j - 1);
                let after = touched(order, i, j);
                if after + IMPROVEMENT_EPSILON_M < before {
                    tracing::trace!(
                        sweep,
                        i,
                        j,
                        gain_m = before - after,
                        "Swap {} <-> {} saves {:.1}m",
                        i, j, before - after
                    );
                    improved = true;
                    break 'scan;
                }
                order.swap(i - 1, j - 1);
            }
        }

        if !improved {
            break;
        }
    }
}

/// Point-to-point visiting order as indices into `points`.
///
/// Points fall into zones by progression along start→end: [0, 1/3),
/// [1/3, 2/3), [2/3, 1]. Zones are visited in order. Inside a zone with more
/// than two points, points are swept clockwise around the zone centroid,
/// beginning from the direction facing the route start; smaller zones go by
/// progression.
pub fn point_to_point_order(
    start: &Coordinates,
    end: &Coordinates,
    points: &[Coordinates],
) -> Vec<usize> {
    if points.len() < 2 {
        return (0..points.len()).collect();
    }

    let mut zones: [Vec<(usize, f64)>; 3] = Default::default();
    for (idx, point) in points.iter().enumerate() {
        let t = geometry::progression(start, end, point);
        let zone = if t < 1.0 / 3.0 {
            0
        } else if t < 2.0 / 3.0 {
            1
        } else {
            2
        };
        zones[zone].push((idx, t));
    }

    let mut order = Vec::with_capacity(points.len());
    for mut zone in zones {
        if zone.len() > 2 {
            let members: Vec<Coordinates> = zone.iter().map(|(i, _)| points[*i]).collect();
            if let Some(centroid) = geometry::centroid(&members) {
                let reference = geometry::bearing_rad(&centroid, start);
                let sweep = |idx: usize| {
                    (geometry::bearing_rad(&centroid, &points[idx]) - reference)
                        .rem_euclid(std::f64::consts::TAU)
                };
                zone.sort_by(|a, b| sweep(a.0).partial_cmp(&sweep(b.0)).unwrap_or(Ordering::Equal));
            }
        } else {
            zone.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        }
        order.extend(zone.into_iter().map(|(i, _)| i));
    }

    order
}

pub fn optimize_point_to_point(
    start: &Coordinates,
    end: &Coordinates,
    points: &[Coordinates],
) -> Vec<Coordinates> {
    point_to_point_order(start, end, points)
        .into_iter()
        .map(|i| points[i])
        .collect()
}
