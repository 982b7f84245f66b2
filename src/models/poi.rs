use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    // Natural/Scenic
    Park,
    Viewpoint,
    Waterfront,
    NatureReserve,

    // Cultural
    Museum,
    Monument,
    Historic,
    Church,
    Artwork,

    // Food & urban
    Cafe,
    Restaurant,
    Market,
}

impl PoiCategory {
    pub const ALL: [PoiCategory; 12] = [
        PoiCategory::Park,
        PoiCategory::Viewpoint,
        PoiCategory::Waterfront,
        PoiCategory::NatureReserve,
        PoiCategory::Museum,
        PoiCategory::Monument,
        PoiCategory::Historic,
        PoiCategory::Church,
        PoiCategory::Artwork,
        PoiCategory::Cafe,
        PoiCategory::Restaurant,
        PoiCategory::Market,
    ];

    /// Free-text terms sent to the place-search service for this category.
    /// Overridable through `ROUTE_CATEGORY_QUERY_TERMS`.
    pub fn default_query_terms(&self) -> &'static [&'static str] {
        match self {
            PoiCategory::Park => &["park", "garden"],
            PoiCategory::Viewpoint => &["viewpoint"],
            PoiCategory::Waterfront => &["waterfront", "promenade"],
            PoiCategory::NatureReserve => &["nature reserve", "national park"],
            PoiCategory::Museum => &["museum", "gallery"],
            PoiCategory::Monument => &["monument", "memorial"],
            PoiCategory::Historic => &["castle", "historic site"],
            PoiCategory::Church => &["church", "cathedral"],
            PoiCategory::Artwork => &["artwork", "sculpture"],
            PoiCategory::Cafe => &["cafe"],
            PoiCategory::Restaurant => &["restaurant"],
            PoiCategory::Market => &["market"],
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoiCategory::Park => "park",
            PoiCategory::Viewpoint => "viewpoint",
            PoiCategory::Waterfront => "waterfront",
            PoiCategory::NatureReserve => "nature_reserve",
            PoiCategory::Museum => "museum",
            PoiCategory::Monument => "monument",
            PoiCategory::Historic => "historic",
            PoiCategory::Church => "church",
            PoiCategory::Artwork => "artwork",
            PoiCategory::Cafe => "cafe",
            PoiCategory::Restaurant => "restaurant",
            PoiCategory::Market => "market",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PoiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "park" => Ok(PoiCategory::Park),
            "viewpoint" => Ok(PoiCategory::Viewpoint),
            "waterfront" => Ok(PoiCategory::Waterfront),
            "nature_reserve" => Ok(PoiCategory::NatureReserve),
            "museum" => Ok(PoiCategory::Museum),
            "monument" => Ok(PoiCategory::Monument),
            "historic" => Ok(PoiCategory::Historic),
            "church" => Ok(PoiCategory::Church),
            "artwork" => Ok(PoiCategory::Artwork),
            "cafe" => Ok(PoiCategory::Cafe),
            "restaurant" => Ok(PoiCategory::Restaurant),
            "market" => Ok(PoiCategory::Market),
            _ => Err(format!("Invalid POI category: {}", s)),
        }
    }
}

/// One hit from the external place-search service, before scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceResult {
    pub location: Coordinates,
    pub display_name: String,
    /// Provider classification, e.g. `tourism:attraction` or `leisure:park`.
    pub category: String,
    /// Provider importance metric (Nominatim reports 0.0-1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
}

/// A scored POI. All score components are already weighted, so
/// `total_score` is their sum and stays within 0-100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoiCandidate {
    pub location: Coordinates,
    pub name: String,
    pub category: PoiCategory,
    pub proximity_score: f64,
    pub importance_score: f64,
    pub diversity_score: f64,
    pub type_bonus: f64,
    pub total_score: f64,
    pub distance_from_center_m: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poi_category_parsing() {
        assert_eq!("museum".parse::<PoiCategory>().unwrap(), PoiCategory::Museum);
        assert_eq!("VIEWPOINT".parse::<PoiCategory>().unwrap(), PoiCategory::Viewpoint);
        assert_eq!(
            " nature_reserve ".parse::<PoiCategory>().unwrap(),
            PoiCategory::NatureReserve
        );
        assert!("invalid".parse::<PoiCategory>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for category in PoiCategory::ALL {
            assert_eq!(category.to_string().parse::<PoiCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_every_category_has_query_terms() {
        for category in PoiCategory::ALL {
            assert!(!category.default_query_terms().is_empty(), "{category}");
        }
    }
}
