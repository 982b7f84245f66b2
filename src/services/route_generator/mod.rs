pub mod context;
pub mod deduplication;
pub mod distance_search;
pub mod geometry;
pub mod poi_scoring;
pub mod route_order;
pub mod tolerance;
pub mod variants;
pub mod waypoint_candidates;

use crate::config::RouteGeneratorConfig;
use crate::error::{AppError, Result};
use crate::models::route::{LoopRouteRequest, PointToPointRouteRequest, RouteResponse};
use crate::models::{
    Coordinates, PoiCandidate, Route, RoutePreferences, RouteTopology, RouteVariant,
    SearchAttempt, SearchStatus, SearchSummary, TransportMode,
};
use crate::services::poi_service::PoiService;
use crate::services::routing::{RoutedPath, RoutingEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

use context::RequestContext;
use distance_search::{assess_direct, AdaptiveSearch, DirectVerdict, SearchGoal, SearchOutcome};
use variants::VariantFrame;

pub const NO_POIS_WARNING: &str = "No POIs could be incorporated into the route";

pub struct RouteGenerator {
    engine: Arc<dyn RoutingEngine>,
    poi_service: PoiService,
    config: RouteGeneratorConfig,
}

impl RouteGenerator {
    pub fn new(
        engine: Arc<dyn RoutingEngine>,
        poi_service: PoiService,
        config: RouteGeneratorConfig,
    ) -> Self {
        RouteGenerator {
            engine,
            poi_service,
            config,
        }
    }

    pub fn config(&self) -> &RouteGeneratorConfig {
        &self.config
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.engine_name()
    }

    /// Generate a loop that returns to its start, as close to the requested
    /// length as the attempt budget allows.
    pub async fn generate_loop_route(
        &self,
        request: &LoopRouteRequest,
        ctx: &RequestContext,
    ) -> Result<RouteResponse> {
        request.validate()?;
        let start = request.start_point;
        let target_km = request.distance_km;
        let mode = request.mode;

        tracing::info!(
            lat = start.lat,
            lng = start.lng,
            target_km,
            mode = %mode,
            seed = ctx.seed,
            "Generating {:.1}km {} loop from ({:.4}, {:.4})",
            target_km, mode, start.lat, start.lng
        );

        let mut warnings = Vec::new();
        let frame = VariantFrame {
            start,
            end: None,
            target_km,
        };
        let variants = self
            .plan_pois(&frame, &request.preferences, ctx, &mut warnings)
            .await?;
        let chosen = variants.first();
        let pois: Vec<PoiCandidate> = chosen.map(|v| v.selected_pois.clone()).unwrap_or_default();

        let goal = SearchGoal {
            target_km,
            tolerance_km: self.config.loop_tolerance.tolerance_km(target_km),
            budget: self.config.attempt_budget(target_km),
            first_index: 1,
        };
        let config = &self.config;
        let outcome = AdaptiveSearch::new(self.engine.as_ref(), config)
            .run(goal, &mode, ctx, |factor, rng| {
                let mut points = waypoint_candidates::generate_candidates(
                    &start, target_km, &mode, factor, rng, config,
                )?;
                points.extend(pois.iter().map(|p| p.location));
                let ordered =
                    route_order::optimize_loop(&start, &points, config.optimizer_max_iterations);
                Ok(close_loop(start, ordered))
            })
            .await?;

        if outcome.summary.status == SearchStatus::Exhausted {
            warnings.push(exhausted_warning(&outcome.summary, target_km));
        }

        let route = routed(RouteTopology::Loop, outcome.path, outcome.waypoints)
            .with_pois(pois, chosen.map(|v| v.strategy))
            .with_search(outcome.summary);

        log_result(&route, target_km);
        Ok(RouteResponse {
            route,
            variants,
            warnings,
        })
    }

    /// Generate a route from start to end. The direct route (through any POIs)
    /// is tried first; detours around the midpoint are only searched for when
    /// it falls well short of the target.
    pub async fn generate_point_to_point_route(
        &self,
        request: &PointToPointRouteRequest,
        ctx: &RequestContext,
    ) -> Result<RouteResponse> {
        request.validate()?;
        let start = request.start_point;
        let end = request.end_point;
        let mode = request.mode;
        let straight_km = geometry::distance_m(&start, &end) / 1000.0;

        tracing::info!(
            start_lat = start.lat,
            start_lng = start.lng,
            end_lat = end.lat,
            end_lng = end.lng,
            target_km = ?request.distance_km,
            mode = %mode,
            "Generating {} route ({:.4}, {:.4}) -> ({:.4}, {:.4}), {:.1}km apart",
            mode, start.lat, start.lng, end.lat, end.lng, straight_km
        );

        let mut warnings = Vec::new();
        let frame = VariantFrame {
            start,
            end: Some(end),
            target_km: request
                .distance_km
                .unwrap_or(straight_km * self.config.road_factor),
        };
        let variants = self
            .plan_pois(&frame, &request.preferences, ctx, &mut warnings)
            .await?;
        let chosen = variants.first();
        let pois: Vec<PoiCandidate> = chosen.map(|v| v.selected_pois.clone()).unwrap_or_default();
        let strategy = chosen.map(|v| v.strategy);
        let direct_points = chosen
            .map(|v| v.waypoints.clone())
            .unwrap_or_else(|| vec![start, end]);

        ctx.check_cancelled()?;
        let direct = match self.engine.compute_route(&direct_points, &mode).await {
            Ok(path) => Some(path),
            Err(AppError::Cancelled) => return Err(AppError::Cancelled),
            Err(e) => {
                tracing::warn!(
                    engine = self.engine.engine_name(),
                    error = %e,
                    "Direct route failed: {}",
                    e
                );
                None
            }
        };
        let direct_km = direct.as_ref().map_or_else(
            || geometry::path_length_m(&direct_points) / 1000.0 * self.config.road_factor,
            RoutedPath::distance_km,
        );
        let direct_attempt = SearchAttempt {
            attempt_index: 0,
            radius_factor: 0.0,
            resulting_distance_km: direct_km,
            deviation_km: request.distance_km.map_or(0.0, |t| (direct_km - t).abs()),
        };
        if direct.is_some() {
            ctx.publish(direct_attempt);
        }

        let verdict = assess_direct(
            direct_km,
            request.distance_km,
            self.config.direct_acceptance_pct,
        );
        tracing::debug!(
            direct_km = %format!("{:.2}", direct_km),
            verdict = ?verdict,
            "Direct route {:.2}km: {:?}",
            direct_km, verdict
        );

        let direct_outcome = |status: SearchStatus, tolerance_km: f64| {
            direct.clone().map(|path| SearchOutcome {
                path,
                waypoints: direct_points.clone(),
                summary: SearchSummary {
                    status,
                    attempts: 1,
                    tolerance_km,
                    best: direct_attempt,
                },
            })
        };
        let unavailable = |attempts: usize| AppError::RoutingUnavailable { attempts };

        let outcome = match verdict {
            DirectVerdict::NoTarget => {
                direct_outcome(SearchStatus::Accepted, 0.0).ok_or_else(|| unavailable(1))?
            }
            DirectVerdict::Accept => {
                let target_km = request.distance_km.unwrap_or(direct_km);
                direct_outcome(
                    SearchStatus::Accepted,
                    target_km * self.config.direct_acceptance_pct,
                )
                .ok_or_else(|| unavailable(1))?
            }
            DirectVerdict::TooLong => {
                let target_km = request.distance_km.unwrap_or(direct_km);
                warnings.push(format!(
                    "Shortest route is {:.1}km, longer than the requested {:.1}km",
                    direct_km, target_km
                ));
                direct_outcome(
                    SearchStatus::Exhausted,
                    target_km * self.config.direct_acceptance_pct,
                )
                .ok_or_else(|| unavailable(1))?
            }
            DirectVerdict::TooShort { extra_km } => {
                let target_km = request.distance_km.unwrap_or(direct_km);
                let detour = self
                    .search_detours(start, end, target_km, extra_km, &pois, &mode, ctx)
                    .await;
                let fallback = direct_outcome(
                    SearchStatus::Exhausted,
                    self.config.point_to_point_tolerance.tolerance_km(target_km),
                );
                match (detour, fallback) {
                    (Ok(detour), Some(direct))
                        if direct.summary.best.deviation_km < detour.summary.best.deviation_km =>
                    {
                        direct
                    }
                    (Ok(detour), _) => detour,
                    (Err(AppError::Cancelled), _) => return Err(AppError::Cancelled),
                    (Err(e), Some(direct)) => {
                        tracing::warn!(error = %e, "Detour search failed, using direct route: {}", e);
                        direct
                    }
                    (Err(AppError::RoutingUnavailable { attempts }), None) => {
                        return Err(unavailable(attempts + 1))
                    }
                    (Err(e), None) => return Err(e),
                }
            }
        };

        if outcome.summary.status == SearchStatus::Exhausted
            && !matches!(verdict, DirectVerdict::TooLong)
        {
            if let Some(target_km) = request.distance_km {
                warnings.push(exhausted_warning(&outcome.summary, target_km));
            }
        }

        // Detour routes carry extra waypoints; keep the POI set unchanged.
        let route = routed(RouteTopology::PointToPoint, outcome.path, outcome.waypoints)
            .with_pois(pois, strategy)
            .with_search(outcome.summary);

        log_result(&route, request.distance_km.unwrap_or(direct_km));
        Ok(RouteResponse {
            route,
            variants,
            warnings,
        })
    }

    /// Adaptive search for detour waypoints around the start/end midpoint.
    /// POIs and detours are ordered together along the start→end axis.
    #[allow(clippy::too_many_arguments)]
    async fn search_detours(
        &self,
        start: Coordinates,
        end: Coordinates,
        target_km: f64,
        extra_km: f64,
        pois: &[PoiCandidate],
        mode: &TransportMode,
        ctx: &RequestContext,
    ) -> Result<SearchOutcome> {
        let midpoint = start.midpoint(&end);
        tracing::info!(
            extra_km = %format!("{:.2}", extra_km),
            "Direct route too short, searching for {:.2}km of detours",
            extra_km
        );

        let goal = SearchGoal {
            target_km,
            tolerance_km: self.config.point_to_point_tolerance.tolerance_km(target_km),
            budget: self.config.attempt_budget(target_km),
            first_index: 1,
        };
        let config = &self.config;
        AdaptiveSearch::new(self.engine.as_ref(), config)
            .run(goal, mode, ctx, |factor, rng| {
                let mut points = waypoint_candidates::generate_candidates(
                    &midpoint, extra_km, mode, factor, rng, config,
                )?;
                points.extend(pois.iter().map(|p| p.location));
                let ordered = route_order::optimize_point_to_point(&start, &end, &points);

                let mut full = Vec::with_capacity(ordered.len() + 2);
                full.push(start);
                full.extend(ordered);
                full.push(end);
                Ok(full)
            })
            .await
    }

    /// Look up POIs for the requested categories and build ranked variants.
    /// POIs that cannot be used are a warning, never a failure.
    async fn plan_pois(
        &self,
        frame: &VariantFrame,
        preferences: &RoutePreferences,
        ctx: &RequestContext,
        warnings: &mut Vec<String>,
    ) -> Result<Vec<RouteVariant>> {
        let categories = preferences.categories();
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let reach_m = poi_scoring::max_acceptable_distance_m(frame.target_km);
        let (center, radius_m) = match frame.end {
            Some(end) => {
                let half_m = geometry::distance_m(&frame.start, &end) / 2.0;
                let center = frame.start.midpoint(&end);
                (center, half_m + reach_m)
            }
            None => (frame.start, reach_m),
        };

        let places = self
            .poi_service
            .find_places(&center, radius_m, categories, &ctx.cancel)
            .await?;

        match variants::plan_variants(&places, frame, &self.config) {
            Ok(variants) => Ok(variants),
            Err(AppError::NoViableVariant(reason)) => {
                tracing::warn!(reason = %reason, "Continuing without POIs: {}", reason);
                warnings.push(NO_POIS_WARNING.to_string());
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Straight-segment loop through the first-attempt candidates, for when
    /// the routing engine cannot be reached.
    pub fn fallback_loop_route(
        &self,
        request: &LoopRouteRequest,
        ctx: &RequestContext,
    ) -> Result<Route> {
        let start = request.start_point;
        let mut rng = StdRng::seed_from_u64(ctx.seed);
        let candidates = waypoint_candidates::generate_candidates(
            &start,
            request.distance_km,
            &request.mode,
            1.0,
            &mut rng,
            &self.config,
        )?;
        let ordered = route_order::optimize_loop(
            &start,
            &candidates,
            self.config.optimizer_max_iterations,
        );
        Ok(direct_line_route(
            RouteTopology::Loop,
            close_loop(start, ordered),
            &request.mode,
        ))
    }

    pub fn fallback_point_to_point_route(&self, request: &PointToPointRouteRequest) -> Route {
        direct_line_route(
            RouteTopology::PointToPoint,
            vec![request.start_point, request.end_point],
            &request.mode,
        )
    }
}

/// Best-effort route of straight segments between `points`, timed at the
/// mode's average speed.
pub fn direct_line_route(
    topology: RouteTopology,
    points: Vec<Coordinates>,
    mode: &TransportMode,
) -> Route {
    let distance_km = geometry::path_length_m(&points) / 1000.0;
    let duration_minutes = (distance_km / mode.average_speed_kmh() * 60.0).round() as u32;
    let mut route = Route::new(topology, distance_km, duration_minutes, points.clone(), points);
    route.direct_line_fallback = true;
    route
}

fn close_loop(start: Coordinates, ordered: Vec<Coordinates>) -> Vec<Coordinates> {
    let mut full = Vec::with_capacity(ordered.len() + 2);
    full.push(start);
    full.extend(ordered);
    full.push(start);
    full
}

fn routed(topology: RouteTopology, path: RoutedPath, waypoints: Vec<Coordinates>) -> Route {
    Route::new(
        topology,
        path.distance_km(),
        path.duration_minutes(),
        path.polyline,
        waypoints,
    )
}

fn exhausted_warning(summary: &SearchSummary, target_km: f64) -> String {
    format!(
        "Closest route found is {:.1}km against a {:.1}km target after {} attempts",
        summary.best.resulting_distance_km, target_km, summary.attempts
    )
}

fn log_result(route: &Route, target_km: f64) {
    tracing::info!(
        route_id = %route.id,
        distance_km = %format!("{:.2}", route.distance_km),
        target_km,
        waypoints = route.waypoints.len(),
        pois = route.pois.len(),
        "Route {} ready: {:.2}km (target {:.1}km), {} POIs",
        route.id, route.distance_km, target_km, route.pois.len()
    );
}
