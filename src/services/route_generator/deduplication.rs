use super::geometry;
use crate::models::PoiCandidate;

/// Merge candidates within `threshold_m` of one another, keeping the higher
/// score. A candidate replaces every kept entry it is close to only when it
/// outscores all of them; on a tie the earlier candidate stays. No two kept
/// candidates are ever within `threshold_m` of each other.
pub fn deduplicate(candidates: Vec<PoiCandidate>, threshold_m: f64) -> Vec<PoiCandidate> {
    let mut kept: Vec<PoiCandidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let close: Vec<usize> = kept
            .iter()
            .enumerate()
            .filter(|(_, k)| geometry::distance_m(&k.location, &candidate.location) <= threshold_m)
            .map(|(idx, _)| idx)
            .collect();

        let Some(&slot) = close.first() else {
            kept.push(candidate);
            continue;
        };
        if close
            .iter()
            .any(|&idx| kept[idx].total_score >= candidate.total_score)
        {
            continue;
        }

        for &idx in &close {
            tracing::trace!(
                kept = %candidate.name,
                dropped = %kept[idx].name,
                "Duplicate POI: keeping '{}' over '{}'",
                candidate.name, kept[idx].name
            );
        }
        kept[slot] = candidate;
        // Indices after `slot` are ascending; remove from the back.
        for &idx in close[1..].iter().rev() {
            kept.remove(idx);
        }
    }

    kept
}
