//! Adaptive radius search toward a target route length.
//!
//! Attempts are strictly sequential: each radius factor is derived from the
//! best routed distance seen so far. The candidate RNG is re-seeded with the
//! same shape seed every attempt, so only the scale of the shape changes and
//! measured length tracks the factor almost linearly.

use super::context::RequestContext;
use crate::config::RouteGeneratorConfig;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, SearchAttempt, SearchStatus, SearchSummary, TransportMode};
use crate::services::routing::{RoutedPath, RoutingEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// Best routed attempt of a search, with the point list that produced it.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub path: RoutedPath,
    pub waypoints: Vec<Coordinates>,
    pub summary: SearchSummary,
}

/// One search request: what to hit, how closely, and how many tries.
#[derive(Debug, Clone, Copy)]
pub struct SearchGoal {
    pub target_km: f64,
    pub tolerance_km: f64,
    pub budget: usize,
    /// Index of the first attempt. Point-to-point searches start at 1 because
    /// the direct route is attempt 0.
    pub first_index: usize,
}

/// Clamp bounds on the target/best ratio for a given attempt (2, 3, ...).
/// They widen with every attempt so later attempts can correct further.
pub fn ratio_bounds(attempt: usize) -> (f64, f64) {
    let widened = attempt.saturating_sub(2) as f64;
    let lo = (RADIUS_RATIO_INITIAL_MIN - RADIUS_RATIO_MIN_STEP * widened).max(RADIUS_RATIO_FLOOR);
    let hi =
        (RADIUS_RATIO_INITIAL_MAX + RADIUS_RATIO_MAX_STEP * widened).min(RADIUS_RATIO_CEILING);
    (lo, hi)
}

/// Radius factor for `attempt` (1-based) given the best attempt so far.
pub fn next_radius_factor(attempt: usize, best: Option<&SearchAttempt>, target_km: f64) -> f64 {
    let Some(best) = best else {
        return 1.0;
    };
    if attempt <= 1 {
        return 1.0;
    }
    let (lo, hi) = ratio_bounds(attempt);
    let ratio = if best.resulting_distance_km > 0.0 {
        target_km / best.resulting_distance_km
    } else {
        hi
    };
    best.radius_factor * ratio.clamp(lo, hi)
}

/// Drives a routing engine through successive radius factors.
pub struct AdaptiveSearch<'a> {
    engine: &'a dyn RoutingEngine,
    config: &'a RouteGeneratorConfig,
}

impl<'a> AdaptiveSearch<'a> {
    pub fn new(engine: &'a dyn RoutingEngine, config: &'a RouteGeneratorConfig) -> Self {
        AdaptiveSearch { engine, config }
    }

    /// Run the search. `build` turns a radius factor and a freshly seeded RNG
    /// into the full ordered point list handed to the router.
    ///
    /// Returns the best-by-deviation attempt, `Accepted` when it is within
    /// tolerance and `Exhausted` when the budget ran out first. Fails only
    /// when no attempt routed at all: `RoutingUnavailable` if the engine
    /// failed, otherwise the last candidate-generation error.
    pub async fn run<F>(
        &self,
        goal: SearchGoal,
        mode: &TransportMode,
        ctx: &RequestContext,
        mut build: F,
    ) -> Result<SearchOutcome>
    where
        F: FnMut(f64, &mut StdRng) -> Result<Vec<Coordinates>> + Send,
    {
        let mut shape_seed = ctx.seed;
        let mut pending_factor = 1.0;
        let mut last_factor: Option<f64> = None;
        let mut best: Option<(SearchAttempt, RoutedPath, Vec<Coordinates>)> = None;
        let mut attempts_made = 0;
        let mut transport_failures = 0;
        let mut candidate_error: Option<AppError> = None;
        let mut accepted = false;

        for n in 1..=goal.budget {
            ctx.check_cancelled()?;
            if n > 1 {
                self.pause(ctx).await?;
            }

            let attempt_index = goal.first_index + n - 1;
            let radius_factor = match &best {
                Some((attempt, _, _)) => next_radius_factor(n, Some(attempt), goal.target_km),
                None => pending_factor,
            };
            // Same factor and seed would just replay the previous attempt.
            if last_factor.is_some_and(|f| (f - radius_factor).abs() < 1e-9) {
                shape_seed = shape_seed.wrapping_add(1);
            }
            last_factor = Some(radius_factor);

            let mut rng = StdRng::seed_from_u64(shape_seed);
            let points = match build(radius_factor, &mut rng) {
                Ok(points) => points,
                Err(e @ AppError::InsufficientCandidates { .. }) => {
                    tracing::warn!(
                        attempt = attempt_index,
                        radius_factor = %format!("{:.3}", radius_factor),
                        error = %e,
                        "Attempt {}: {}",
                        attempt_index, e
                    );
                    if best.is_none() {
                        pending_factor = radius_factor * INSUFFICIENT_CANDIDATES_RADIUS_NUDGE;
                    }
                    shape_seed = shape_seed.wrapping_add(1);
                    candidate_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let path = match self.engine.compute_route(&points, mode).await {
                Ok(path) => path,
                Err(AppError::Cancelled) => return Err(AppError::Cancelled),
                Err(e) => {
                    transport_failures += 1;
                    tracing::warn!(
                        attempt = attempt_index,
                        engine = self.engine.engine_name(),
                        error = %e,
                        "Attempt {}: routing failed: {}",
                        attempt_index, e
                    );
                    shape_seed = shape_seed.wrapping_add(1);
                    continue;
                }
            };

            attempts_made = n;
            let achieved_km = path.distance_km();
            let record = SearchAttempt {
                attempt_index,
                radius_factor,
                resulting_distance_km: achieved_km,
                deviation_km: (achieved_km - goal.target_km).abs(),
            };
            ctx.publish(record);

            tracing::info!(
                attempt = attempt_index,
                radius_factor = %format!("{:.3}", radius_factor),
                achieved_km = %format!("{:.2}", achieved_km),
                target_km = goal.target_km,
                deviation_km = %format!("{:.2}", record.deviation_km),
                "Attempt {}: factor {:.3} -> {:.2}km (target {:.1}km, off by {:.2}km)",
                attempt_index, radius_factor, achieved_km, goal.target_km, record.deviation_km
            );

            let improved = best
                .as_ref()
                .map_or(true, |(b, _, _)| record.deviation_km < b.deviation_km);
            if improved {
                best = Some((record, path, points));
            }

            if record.deviation_km <= goal.tolerance_km {
                accepted = true;
                break;
            }
        }

        match best {
            Some((attempt, path, waypoints)) => {
                let status = if accepted {
                    SearchStatus::Accepted
                } else {
                    SearchStatus::Exhausted
                };
                // Failed attempts still count against the budget.
                let attempts = if accepted { attempts_made } else { goal.budget };
                Ok(SearchOutcome {
                    path,
                    waypoints,
                    summary: SearchSummary {
                        status,
                        attempts,
                        tolerance_km: goal.tolerance_km,
                        best: attempt,
                    },
                })
            }
            None if transport_failures > 0 => Err(AppError::RoutingUnavailable {
                attempts: goal.budget,
            }),
            None => Err(candidate_error.unwrap_or(AppError::InsufficientCandidates {
                generated: 0,
                required: self.config.min_candidate_waypoints,
            })),
        }
    }

    async fn pause(&self, ctx: &RequestContext) -> Result<()> {
        if self.config.attempt_delay_ms == 0 {
            return Ok(());
        }
        tokio::select! {
            _ = ctx.cancel.cancelled() => Err(AppError::Cancelled),
            _ = tokio::time::sleep(Duration::from_millis(self.config.attempt_delay_ms)) => Ok(()),
        }
    }
}

/// Verdict on the direct point-to-point route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectVerdict {
    /// No target was requested.
    NoTarget,
    /// Within the acceptance bound of the target.
    Accept,
    /// Longer than the target allows; detours can only make it longer.
    TooLong,
    /// Shorter than the target: detours need to add `extra_km`.
    TooShort { extra_km: f64 },
}

pub fn assess_direct(direct_km: f64, target_km: Option<f64>, acceptance_pct: f64) -> DirectVerdict {
    let Some(target_km) = target_km else {
        return DirectVerdict::NoTarget;
    };
    if (direct_km - target_km).abs() <= target_km * acceptance_pct {
        DirectVerdict::Accept
    } else if direct_km > target_km {
        DirectVerdict::TooLong
    } else {
        DirectVerdict::TooShort {
            extra_km: target_km - direct_km,
        }
    }
}
