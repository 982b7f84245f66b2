//! POI relevance scoring.
//!
//! A candidate's total is the sum of four already-weighted components:
//!
//! - proximity (≤50): linear falloff from the reference to the cutoff distance
//! - importance (≤30): keyword and classification bonuses plus the provider's
//!   importance metric when it clears a threshold
//! - diversity (≤15): one point per 500 m from the nearest chosen waypoint
//! - type bonus (≤5): small nudges for parks, gardens and tourism features
//!
//! Candidates beyond the cutoff are excluded before scoring, so every
//! returned total lies in 0-100.

use super::geometry;
use crate::constants::*;
use crate::models::{Coordinates, PlaceResult, PoiCandidate, PoiCategory};

/// Keyword → importance bonus, matched case-insensitively against the
/// display name and provider classification.
const IMPORTANCE_KEYWORDS: &[(&str, f64)] = &[
    ("national park", 15.0),
    ("cathedral", 12.0),
    ("castle", 10.0),
    ("attraction", 10.0),
    ("museum", 8.0),
    ("monument", 6.0),
    ("memorial", 6.0),
    ("viewpoint", 5.0),
];

/// Provider importance above the threshold earns up to this many points.
const PROVIDER_IMPORTANCE_WEIGHT: f64 = 20.0;

const TYPE_BONUSES: &[(&str, f64)] = &[("park", 3.0), ("garden", 3.0), ("tourism", 2.0)];

/// What proximity is measured against.
#[derive(Debug, Clone, Copy)]
pub enum ScoringReference {
    /// Loop routes: the start point.
    Center(Coordinates),
    /// Point-to-point routes: the straight start→end corridor.
    Corridor { start: Coordinates, end: Coordinates },
}

impl ScoringReference {
    pub fn distance_m(&self, point: &Coordinates) -> f64 {
        match self {
            ScoringReference::Center(center) => geometry::distance_m(center, point),
            ScoringReference::Corridor { start, end } => {
                geometry::point_to_segment_distance_m(point, start, end)
            }
        }
    }
}

/// Maximum acceptable distance from the reference for a target route length.
pub fn max_acceptable_distance_m(target_km: f64) -> f64 {
    target_km * 1000.0 / POI_MAX_DISTANCE_DIVISOR
}

pub fn proximity_score(distance_m: f64, max_distance_m: f64) -> f64 {
    if max_distance_m <= 0.0 {
        return 0.0;
    }
    ((max_distance_m - distance_m) / max_distance_m * POI_PROXIMITY_WEIGHT).max(0.0)
}

pub fn importance_score(place: &PlaceResult) -> f64 {
    let haystack = format!("{} {}", place.display_name, place.category).to_lowercase();

    let keyword_bonus: f64 = IMPORTANCE_KEYWORDS
        .iter()
        .filter(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, bonus)| bonus)
        .sum();

    let provider_bonus = match place.importance {
        Some(importance) if importance > POI_IMPORTANCE_THRESHOLD => {
            importance.min(1.0) * PROVIDER_IMPORTANCE_WEIGHT
        }
        _ => 0.0,
    };

    (keyword_bonus + provider_bonus).min(POI_IMPORTANCE_CAP)
}

/// Full marks when nothing has been chosen yet.
pub fn diversity_score(location: &Coordinates, existing: &[Coordinates]) -> f64 {
    existing
        .iter()
        .map(|p| geometry::distance_m(location, p))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map_or(POI_DIVERSITY_CAP, |nearest| {
            (nearest / POI_DIVERSITY_METERS_PER_POINT).min(POI_DIVERSITY_CAP)
        })
}

pub fn type_bonus(place: &PlaceResult) -> f64 {
    let haystack = format!("{} {}", place.display_name, place.category).to_lowercase();
    TYPE_BONUSES
        .iter()
        .filter(|(hint, _)| haystack.contains(hint))
        .map(|(_, bonus)| bonus)
        .sum::<f64>()
        .min(POI_TYPE_BONUS_CAP)
}

/// Score one place, or `None` when it lies beyond `max_distance_m`.
pub fn score_place(
    place: &PlaceResult,
    category: PoiCategory,
    reference: &ScoringReference,
    max_distance_m: f64,
    existing: &[Coordinates],
) -> Option<PoiCandidate> {
    let distance_m = reference.distance_m(&place.location);
    if distance_m > max_distance_m {
        return None;
    }

    let proximity_score = proximity_score(distance_m, max_distance_m);
    let importance_score = importance_score(place);
    let diversity_score = diversity_score(&place.location, existing);
    let type_bonus = type_bonus(place);

    Some(PoiCandidate {
        location: place.location,
        name: place.display_name.clone(),
        category,
        proximity_score,
        importance_score,
        diversity_score,
        type_bonus,
        total_score: proximity_score + importance_score + diversity_score + type_bonus,
        distance_from_center_m: distance_m,
    })
}

/// Score every place of a category. An empty result is not an error.
pub fn score_places(
    places: &[PlaceResult],
    category: PoiCategory,
    reference: &ScoringReference,
    max_distance_m: f64,
    existing: &[Coordinates],
) -> Vec<PoiCandidate> {
    places
        .iter()
        .filter_map(|place| score_place(place, category, reference, max_distance_m, existing))
        .collect()
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

    #[test]
    fn test_proximity_falls_off_linearly() {
        assert_eq!(proximity_score(0.0, 1_000.0), 50.0);
        assert_eq!(proximity_score(500.0, 1_000.0), 25.0);
        assert_eq!(proximity_score(1_500.0, 1_000.0), 0.0);
    }

    #[test]
    fn test_importance_is_capped() {
        let famous = place(
            "Cathedral Castle Museum National Park",
            "tourism:attraction",
            Some(0.95),
            c(0.0, 0.0),
        );
        assert_eq!(importance_score(&famous), POI_IMPORTANCE_CAP);

        let plain = place("Corner shop", "shop:convenience", Some(0.1), c(0.0, 0.0));
        assert_eq!(importance_score(&plain), 0.0);
    }

    #[test]
    fn test_provider_importance_needs_threshold() {
        let low = place("Somewhere", "place:square", Some(0.3), c(0.0, 0.0));
        let high = place("Somewhere", "place:square", Some(0.5), c(0.0, 0.0));
        assert_eq!(importance_score(&low), 0.0);
        assert!((importance_score(&high) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_diversity() {
        let here = c(48.8566, 2.3522);
        assert_eq!(diversity_score(&here, &[]), POI_DIVERSITY_CAP);
        assert_eq!(diversity_score(&here, &[here]), 0.0);

        let far = c(49.5, 2.3522); // ~70 km away
        assert_eq!(diversity_score(&here, &[far]), POI_DIVERSITY_CAP);
    }

    #[test]
    fn test_type_bonus_capped() {
        let garden = place("Park Garden", "tourism:attraction", None, c(0.0, 0.0));
        assert_eq!(type_bonus(&garden), POI_TYPE_BONUS_CAP);
        let cafe = place("Le Café", "amenity:cafe", None, c(0.0, 0.0));
        assert_eq!(type_bonus(&cafe), 0.0);
    }

    #[test]
    fn test_candidates_beyond_cutoff_are_excluded() {
        let center = c(48.8566, 2.3522);
        let reference = ScoringReference::Center(center);
        let max = max_acceptable_distance_m(3.0); // 1 km

        let near = place("Near park", "leisure:park", None, c(48.8606, 2.3522)); // ~445 m
        let far = place("Far park", "leisure:park", None, c(48.8766, 2.3522)); // ~2.2 km

        let scored = score_places(&[near, far], PoiCategory::Park, &reference, max, &[center]);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].name, "Near park");

        let total = scored[0].total_score;
        assert!((0.0..=100.0).contains(&total));
        let parts = scored[0].proximity_score
            + scored[0].importance_score
            + scored[0].diversity_score
            + scored[0].type_bonus;
        assert!((total - parts).abs() < 1e-9);
    }

    #[test]
    fn test_corridor_reference_uses_segment_distance() {
        let start = c(48.85, 2.30);
        let end = c(48.85, 2.40);
        let reference = ScoringReference::Corridor { start, end };

        // Halfway along the corridor, on the line: far from both ends but distance ~0.
        let on_line = c(48.85, 2.35);
        assert!(reference.distance_m(&on_line) < 1.0);
        assert!(ScoringReference::Center(start).distance_m(&on_line) > 3_000.0);
    }
}
