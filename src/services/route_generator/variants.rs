//! POI variant construction and ranking.
//!
//! Each category's places are scored, deduplicated, floored and cut to the
//! top few. Every strategy then draws one POI plan from those pools. A plan
//! is ranked on how close its estimated length is to the target (≤40) plus
//! the importance of its POIs (≤35).

use super::deduplication::deduplicate;
use super::geometry;
use super::poi_scoring::{self, ScoringReference};
use super::route_order;
use crate::config::RouteGeneratorConfig;
use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, PlaceResult, PoiCandidate, PoiCategory, RouteVariant, VariantStrategy};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Endpoints the POIs are threaded between. `end = None` is a loop.
#[derive(Debug, Clone, Copy)]
pub struct VariantFrame {
    pub start: Coordinates,
    pub end: Option<Coordinates>,
    pub target_km: f64,
}

impl VariantFrame {
    fn anchors(&self) -> Vec<Coordinates> {
        std::iter::once(self.start).chain(self.end).collect()
    }

    fn reference(&self) -> ScoringReference {
        match self.end {
            Some(end) => ScoringReference::Corridor {
                start: self.start,
                end,
            },
            None => ScoringReference::Center(self.start),
        }
    }
}

/// Strategies in generation order. Ranking ties keep this order.
pub const STRATEGIES: [VariantStrategy; 3] = [
    VariantStrategy::BestFromEachCategory,
    VariantStrategy::MaxTotalScore,
    VariantStrategy::MaxDiversity,
];

/// Scored, deduplicated, floored and truncated candidates per category,
/// best first.
pub fn build_pools(
    places: &BTreeMap<PoiCategory, Vec<PlaceResult>>,
    frame: &VariantFrame,
    config: &RouteGeneratorConfig,
) -> BTreeMap<PoiCategory, Vec<PoiCandidate>> {
    let reference = frame.reference();
    let max_distance_m = poi_scoring::max_acceptable_distance_m(frame.target_km);
    let anchors = frame.anchors();

    places
        .iter()
        .map(|(category, found)| {
            let scored =
                poi_scoring::score_places(found, *category, &reference, max_distance_m, &anchors);
            let mut pool = deduplicate(scored, config.poi_dedup_threshold_m);
            pool.retain(|c| c.total_score >= config.poi_min_score);
            sort_by_score(&mut pool);
            pool.truncate(config.pois_per_category);
            (*category, pool)
        })
        .collect()
}

/// Build and rank one variant per strategy.
///
/// No places at all is not an error: the route goes ahead without POIs.
/// Places that were found but all fell below the acceptance floor are
/// `NoViableVariant`.
pub fn plan_variants(
    places: &BTreeMap<PoiCategory, Vec<PlaceResult>>,
    frame: &VariantFrame,
    config: &RouteGeneratorConfig,
) -> Result<Vec<RouteVariant>> {
    let found: usize = places.values().map(Vec::len).sum();
    if found == 0 {
        return Ok(Vec::new());
    }

    let pools = build_pools(places, frame, config);
    let usable: usize = pools.values().map(Vec::len).sum();
    if usable == 0 {
        return Err(AppError::NoViableVariant(format!(
            "{} places found, none scored above {}",
            found, config.poi_min_score
        )));
    }

    let mut variants: Vec<RouteVariant> = Vec::new();
    for strategy in STRATEGIES {
        let selected = select_pois(strategy, &pools, frame, config.poi_dedup_threshold_m);
        if selected.is_empty() {
            continue;
        }
        let variant = build_variant(strategy, selected, frame, config);
        // Strategies often agree; keep only the first of identical plans.
        if variants.iter().any(|v| v.waypoints == variant.waypoints) {
            continue;
        }
        variants.push(variant);
    }

    rank_variants(&mut variants);

    tracing::debug!(
        variants = variants.len(),
        usable_pois = usable,
        "Built {} POI variants from {} usable POIs",
        variants.len(), usable
    );

    Ok(variants)
}

/// Descending by total score; equal scores keep their order.
pub fn rank_variants(variants: &mut [RouteVariant]) {
    variants.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });
}

pub fn distance_fit_score(estimated_km: f64, target_km: f64) -> f64 {
    if target_km <= 0.0 {
        return 0.0;
    }
    ((1.0 - (estimated_km - target_km).abs() / target_km) * VARIANT_DISTANCE_FIT_WEIGHT).max(0.0)
}

pub fn variant_importance_score(pois: &[PoiCandidate]) -> f64 {
    let sum: f64 = pois.iter().map(|p| p.importance_score).sum();
    (sum / VARIANT_IMPORTANCE_DIVISOR).min(VARIANT_IMPORTANCE_CAP)
}

fn sort_by_score(pois: &mut [PoiCandidate]) {
    pois.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });
}

fn near_any(candidate: &PoiCandidate, chosen: &[PoiCandidate], threshold_m: f64) -> bool {
    chosen
        .iter()
        .any(|c| geometry::distance_m(&c.location, &candidate.location) <= threshold_m)
}

fn select_pois(
    strategy: VariantStrategy,
    pools: &BTreeMap<PoiCategory, Vec<PoiCandidate>>,
    frame: &VariantFrame,
    threshold_m: f64,
) -> Vec<PoiCandidate> {
    let slots = pools.values().filter(|p| !p.is_empty()).count();
    let mut all: Vec<PoiCandidate> = pools.values().flatten().cloned().collect();
    sort_by_score(&mut all);

    let mut chosen: Vec<PoiCandidate> = Vec::with_capacity(slots);
    match strategy {
        VariantStrategy::BestFromEachCategory => {
            for pool in pools.values() {
                // The same place can surface under two categories.
                if let Some(best) = pool.iter().find(|c| !near_any(c, &chosen, threshold_m)) {
                    chosen.push(best.clone());
                }
            }
        }
        VariantStrategy::MaxTotalScore => {
            for candidate in all {
                if chosen.len() == slots {
                    break;
                }
                if !near_any(&candidate, &chosen, threshold_m) {
                    chosen.push(candidate);
                }
            }
        }
        VariantStrategy::MaxDiversity => {
            // Greedy farthest-point: each pick maximizes its distance to the
            // route anchors and everything already picked.
            let anchors = frame.anchors();
            let mut remaining = all;
            while chosen.len() < slots && !remaining.is_empty() {
                let spread = |c: &PoiCandidate| {
                    anchors
                        .iter()
                        .chain(chosen.iter().map(|p| &p.location))
                        .map(|p| geometry::distance_m(p, &c.location))
                        .fold(f64::INFINITY, f64::min)
                };
                let mut best_idx = 0;
                let mut best_spread = f64::NEG_INFINITY;
                for (idx, candidate) in remaining.iter().enumerate() {
                    let s = spread(candidate);
                    if s > best_spread {
                        best_spread = s;
                        best_idx = idx;
                    }
                }
                let pick = remaining.remove(best_idx);
                if best_spread > threshold_m {
                    chosen.push(pick);
                }
            }
        }
    }

    chosen
}

fn build_variant(
    strategy: VariantStrategy,
    selected: Vec<PoiCandidate>,
    frame: &VariantFrame,
    config: &RouteGeneratorConfig,
) -> RouteVariant {
    let locations: Vec<Coordinates> = selected.iter().map(|p| p.location).collect();
    let order = match frame.end {
        Some(end) => route_order::point_to_point_order(&frame.start, &end, &locations),
        None => {
            route_order::loop_order(&frame.start, &locations, config.optimizer_max_iterations)
        }
    };
    let selected_pois: Vec<PoiCandidate> = order.iter().map(|&i| selected[i].clone()).collect();

    let mut waypoints = Vec::with_capacity(selected_pois.len() + 2);
    waypoints.push(frame.start);
    waypoints.extend(selected_pois.iter().map(|p| p.location));
    waypoints.push(frame.end.unwrap_or(frame.start));

    let estimated_distance_km = geometry::path_length_m(&waypoints) / 1000.0 * config.road_factor;
    let distance_fit_score = distance_fit_score(estimated_distance_km, frame.target_km);
    let importance_score = variant_importance_score(&selected_pois);

    RouteVariant {
        waypoints,
        selected_pois,
        strategy,
        estimated_distance_km,
        distance_fit_score,
        importance_score,
        total_score: distance_fit_score + importance_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    fn place(name: &str, category: &str, importance: Option<f64>, at: Coordinates) -> PlaceResult {
        PlaceResult {
            location: at,
            display_name: name.to_string(),
            category: category.to_string(),
            importance,
        }
    }

    fn loop_frame() -> VariantFrame {
        VariantFrame {
            start: c(48.8566, 2.3522),
            end: None,
            target_km: 6.0,
        }
    }

    fn variant(total_score: f64, strategy: VariantStrategy) -> RouteVariant {
        RouteVariant {
            waypoints: vec![],
            selected_pois: vec![],
            strategy,
            estimated_distance_km: 0.0,
            distance_fit_score: total_score,
            importance_score: 0.0,
            total_score,
        }
    }

    #[test]
    fn test_distance_fit_score() {
        assert_eq!(distance_fit_score(10.0, 10.0), 40.0);
        assert_eq!(distance_fit_score(15.0, 10.0), 20.0);
        assert_eq!(distance_fit_score(25.0, 10.0), 0.0);
    }

    #[test]
    fn test_importance_score_capped() {
        let frame = loop_frame();
        let config = RouteGeneratorConfig::default();
        let mut places = BTreeMap::new();
        places.insert(
            PoiCategory::Museum,
            vec![place("Museum", "tourism:museum", Some(0.9), c(48.8606, 2.3376))],
        );
        let pools = build_pools(&places, &frame, &config);
        let pois = vec![pools[&PoiCategory::Museum][0].clone(); 4];
        assert_eq!(variant_importance_score(&pois), VARIANT_IMPORTANCE_CAP);
        assert_eq!(variant_importance_score(&[]), 0.0);
    }

    #[test]
    fn test_ranking_is_stable() {
        let mut variants = vec![
            variant(50.0, VariantStrategy::BestFromEachCategory),
            variant(70.0, VariantStrategy::MaxTotalScore),
            variant(50.0, VariantStrategy::MaxDiversity),
        ];
        rank_variants(&mut variants);
        let order: Vec<VariantStrategy> = variants.iter().map(|v| v.strategy).collect();
        assert_eq!(
            order,
            vec![
                VariantStrategy::MaxTotalScore,
                VariantStrategy::BestFromEachCategory,
                VariantStrategy::MaxDiversity
            ]
        );

        let again = order.clone();
        rank_variants(&mut variants);
        let order: Vec<VariantStrategy> = variants.iter().map(|v| v.strategy).collect();
        assert_eq!(order, again);
    }

    #[test]
    fn test_no_places_is_not_an_error() {
        let mut places = BTreeMap::new();
        places.insert(PoiCategory::Park, vec![]);
        let variants =
            plan_variants(&places, &loop_frame(), &RouteGeneratorConfig::default()).unwrap();
        assert!(variants.is_empty());
    }

    #[test]
    fn test_all_below_floor_is_no_viable_variant() {
        let mut places = BTreeMap::new();
        // Outside the 2 km cutoff for a 6 km target.
        places.insert(
            PoiCategory::Park,
            vec![place("Bois de Vincennes", "leisure:park", None, c(48.8283, 2.4330))],
        );
        let result = plan_variants(&places, &loop_frame(), &RouteGeneratorConfig::default());
        assert!(matches!(result, Err(AppError::NoViableVariant(_))));
    }

    #[test]
    fn test_pools_keep_top_n_per_category() {
        let frame = loop_frame();
        let config = RouteGeneratorConfig {
            pois_per_category: 2,
            ..RouteGeneratorConfig::default()
        };
        let mut places = BTreeMap::new();
        places.insert(
            PoiCategory::Park,
            vec![
                place("Far park", "leisure:park", None, c(48.8666, 2.3522)),
                place("Near park", "leisure:park", None, c(48.8586, 2.3522)),
                place("Mid park", "leisure:park", None, c(48.8626, 2.3522)),
            ],
        );
        let pools = build_pools(&places, &frame, &config);
        let names: Vec<&str> = pools[&PoiCategory::Park]
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names.len(), 2);
        let scores: Vec<f64> = pools[&PoiCategory::Park]
            .iter()
            .map(|p| p.total_score)
            .collect();
        assert!(scores[0] >= scores[1]);
    }

    #[test]
    fn test_best_from_each_category_takes_one_per_category() {
        let frame = loop_frame();
        let config = RouteGeneratorConfig::default();
        let mut places = BTreeMap::new();
        places.insert(
            PoiCategory::Park,
            vec![
                place("Jardin des Plantes", "leisure:park", None, c(48.8440, 2.3590)),
                place("Square du Temple", "leisure:park", None, c(48.8644, 2.3607)),
            ],
        );
        places.insert(
            PoiCategory::Museum,
            vec![place("Musée Carnavalet", "tourism:museum", Some(0.6), c(48.8575, 2.3625))],
        );

        let variants = plan_variants(&places, &frame, &config).unwrap();
        assert!(!variants.is_empty());

        let best_each = variants
            .iter()
            .find(|v| v.strategy == VariantStrategy::BestFromEachCategory)
            .unwrap();
        assert_eq!(best_each.selected_pois.len(), 2);
        let mut categories: Vec<PoiCategory> =
            best_each.selected_pois.iter().map(|p| p.category).collect();
        categories.sort();
        assert_eq!(categories, vec![PoiCategory::Park, PoiCategory::Museum]);

        // Loop waypoints are closed around the start.
        assert_eq!(best_each.waypoints.first(), Some(&frame.start));
        assert_eq!(best_each.waypoints.last(), Some(&frame.start));
        assert_eq!(best_each.waypoints.len(), 4);

        // Ranked best first.
        for pair in variants.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn test_point_to_point_variant_ends_at_destination() {
        let frame = VariantFrame {
            start: c(48.85, 2.30),
            end: Some(c(48.85, 2.40)),
            target_km: 12.0,
        };
        let mut places = BTreeMap::new();
        places.insert(
            PoiCategory::Viewpoint,
            vec![
                place("Late viewpoint", "tourism:viewpoint", None, c(48.852, 2.38)),
                place("Early viewpoint", "tourism:viewpoint", None, c(48.852, 2.32)),
            ],
        );
        let config = RouteGeneratorConfig {
            pois_per_category: 3,
            ..RouteGeneratorConfig::default()
        };
        let variants = plan_variants(&places, &frame, &config).unwrap();
        let top = &variants[0];
        assert_eq!(top.waypoints.last(), frame.end.as_ref());
        assert!(top.estimated_distance_km > 0.0);
    }
}
