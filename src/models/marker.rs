use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// Closed set of map marker roles attached to a generated route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    Start,
    End,
    Waypoint,
    Poi,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub icon: &'static str,
    pub size_px: u16,
    pub draggable: bool,
}

impl MarkerKind {
    pub fn style(&self) -> MarkerStyle {
        match self {
            MarkerKind::Start => MarkerStyle {
                color: "#2e7d32",
                icon: "play",
                size_px: 32,
                draggable: true,
            },
            MarkerKind::End => MarkerStyle {
                color: "#c62828",
                icon: "flag",
                size_px: 32,
                draggable: true,
            },
            MarkerKind::Waypoint => MarkerStyle {
                color: "#1565c0",
                icon: "circle",
                size_px: 16,
                draggable: false,
            },
            MarkerKind::Poi => MarkerStyle {
                color: "#f9a825",
                icon: "star",
                size_px: 24,
                draggable: false,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub location: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub style: MarkerStyle,
}

impl Marker {
    pub fn new(kind: MarkerKind, location: Coordinates, label: Option<String>) -> Self {
        Marker {
            kind,
            location,
            label,
            style: kind.style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_are_distinct_per_kind() {
        let kinds = [
            MarkerKind::Start,
            MarkerKind::End,
            MarkerKind::Waypoint,
            MarkerKind::Poi,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.style().color, b.style().color);
            }
        }
    }

    #[test]
    fn test_marker_carries_resolved_style() {
        let marker = Marker::new(
            MarkerKind::Poi,
            Coordinates::new(48.86, 2.35).unwrap(),
            Some("Louvre".to_string()),
        );
        assert_eq!(marker.style, MarkerKind::Poi.style());
        let json = serde_json::to_value(&marker).unwrap();
        assert_eq!(json["kind"], "poi");
        assert_eq!(json["style"]["icon"], "star");
    }
}
