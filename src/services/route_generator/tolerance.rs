//! Distance-bracket tolerance and per-mode search radius tables.
//!
//! Both tables are plain configuration data. They parse from the compact
//! env-var formats documented on their `FromStr` impls and validate their
//! invariants at parse time, so a running generator never sees a malformed table.

use crate::models::TransportMode;
use std::fmt;
use std::str::FromStr;

/// One bracket: targets up to `max_km` (inclusive) may deviate by `tolerance`
/// (fraction of the target). The last bracket has `max_km = None` (unbounded).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBracket {
    pub max_km: Option<f64>,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToleranceTable {
    brackets: Vec<ToleranceBracket>,
}

impl ToleranceTable {
    /// Brackets must be ascending, end with an unbounded bracket, and never
    /// tighten as targets grow.
    pub fn new(brackets: Vec<ToleranceBracket>) -> Result<Self, String> {
        let Some(last) = brackets.last() else {
            return Err("Tolerance table must have at least one bracket".to_string());
        };
        if last.max_km.is_some() {
            return Err("Last tolerance bracket must be unbounded ('*')".to_string());
        }

        let mut previous: Option<&ToleranceBracket> = None;
        for bracket in &brackets {
            if !(bracket.tolerance > 0.0 && bracket.tolerance < 1.0) {
                return Err(format!(
                    "Tolerance {} must be a fraction in (0, 1)",
                    bracket.tolerance
                ));
            }
            if let Some(prev) = previous {
                let (Some(prev_max), max) = (prev.max_km, bracket.max_km) else {
                    return Err("Only the last tolerance bracket may be unbounded".to_string());
                };
                if let Some(max) = max {
                    if max <= prev_max {
                        return Err(format!(
                            "Tolerance brackets must be ascending ({} after {})",
                            max, prev_max
                        ));
                    }
                }
                if bracket.tolerance < prev.tolerance {
                    return Err(format!(
                        "Tolerance must not decrease with distance ({} after {})",
                        bracket.tolerance, prev.tolerance
                    ));
                }
            }
            previous = Some(bracket);
        }

        Ok(Self { brackets })
    }

    /// Default loop tolerances: ≤8 km 5%, ≤20 km 8%, ≤50 km 12%, else 15%.
    pub fn loop_default() -> Self {
        Self {
            brackets: vec![
                ToleranceBracket { max_km: Some(8.0), tolerance: 0.05 },
                ToleranceBracket { max_km: Some(20.0), tolerance: 0.08 },
                ToleranceBracket { max_km: Some(50.0), tolerance: 0.12 },
                ToleranceBracket { max_km: None, tolerance: 0.15 },
            ],
        }
    }

    /// Point-to-point detours are harder to aim, hence the looser bands.
    pub fn point_to_point_default() -> Self {
        Self {
            brackets: vec![
                ToleranceBracket { max_km: Some(10.0), tolerance: 0.15 },
                ToleranceBracket { max_km: Some(30.0), tolerance: 0.20 },
                ToleranceBracket { max_km: None, tolerance: 0.25 },
            ],
        }
    }

    /// Allowed relative deviation for a target distance.
    pub fn tolerance(&self, target_km: f64) -> f64 {
        self.brackets
            .iter()
            .find(|b| b.max_km.map_or(true, |max| target_km <= max))
            .map(|b| b.tolerance)
            // The constructor guarantees an unbounded last bracket.
            .unwrap_or(0.15)
    }

    /// Allowed absolute deviation in km.
    pub fn tolerance_km(&self, target_km: f64) -> f64 {
        target_km * self.tolerance(target_km)
    }
}

/// Format: `8:0.05,20:0.08,50:0.12,*:0.15`
impl FromStr for ToleranceTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let brackets = s
            .split(',')
            .map(|entry| {
                let (max, tolerance) = entry
                    .trim()
                    .split_once(':')
                    .ok_or_else(|| format!("Invalid tolerance bracket '{}'", entry))?;
                let max_km = match max.trim() {
                    "*" => None,
                    v => Some(
                        v.parse::<f64>()
                            .map_err(|_| format!("Invalid bracket distance '{}'", v))?,
                    ),
                };
                let tolerance = tolerance
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid tolerance '{}'", tolerance))?;
                Ok(ToleranceBracket { max_km, tolerance })
            })
            .collect::<Result<Vec<_>, String>>()?;
        Self::new(brackets)
    }
}

impl fmt::Display for ToleranceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .brackets
            .iter()
            .map(|b| match b.max_km {
                Some(max) => format!("{}:{}", max, b.tolerance),
                None => format!("*:{}", b.tolerance),
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Base and maximum candidate radius as fractions of the target distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius {
    pub base_fraction: f64,
    pub max_fraction: f64,
}

impl SearchRadius {
    pub fn base_radius_km(&self, target_km: f64) -> f64 {
        target_km * self.base_fraction
    }

    pub fn max_radius_km(&self, target_km: f64) -> f64 {
        target_km * self.max_fraction
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRadiusTable {
    pub walk: SearchRadius,
    pub run: SearchRadius,
    pub bike: SearchRadius,
}

impl SearchRadiusTable {
    pub fn for_mode(&self, mode: &TransportMode) -> SearchRadius {
        match mode {
            TransportMode::Walk => self.walk,
            TransportMode::Run => self.run,
            TransportMode::Bike => self.bike,
        }
    }

    fn validate(radius: &SearchRadius) -> Result<(), String> {
        if radius.base_fraction < 0.0 || radius.max_fraction < radius.base_fraction {
            return Err(format!(
                "Search radius must satisfy max >= base >= 0 (base {}, max {})",
                radius.base_fraction, radius.max_fraction
            ));
        }
        Ok(())
    }
}

impl Default for SearchRadiusTable {
    fn default() -> Self {
        let walking = SearchRadius {
            base_fraction: 0.14,
            max_fraction: 0.35,
        };
        Self {
            walk: walking,
            run: walking,
            bike: SearchRadius {
                base_fraction: 0.15,
                max_fraction: 0.40,
            },
        }
    }
}

/// Format: `walk=0.14/0.35,run=0.14/0.35,bike=0.15/0.40`.
/// Modes left out keep their defaults.
impl FromStr for SearchRadiusTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = Self::default();
        for entry in s.split(',').filter(|e| !e.trim().is_empty()) {
            let (mode, fractions) = entry
                .trim()
                .split_once('=')
                .ok_or_else(|| format!("Invalid search radius entry '{}'", entry))?;
            let (base, max) = fractions
                .split_once('/')
                .ok_or_else(|| format!("Invalid search radius fractions '{}'", fractions))?;
            let radius = SearchRadius {
                base_fraction: base
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid base fraction '{}'", base))?,
                max_fraction: max
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid max fraction '{}'", max))?,
            };
            Self::validate(&radius)?;
            match mode.parse::<TransportMode>()? {
                TransportMode::Walk => table.walk = radius,
                TransportMode::Run => table.run = radius,
                TransportMode::Bike => table.bike = radius,
            }
        }
        Ok(table)
    }
}

impl fmt::Display for SearchRadiusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "walk={}/{},run={}/{},bike={}/{}",
            self.walk.base_fraction,
            self.walk.max_fraction,
            self.run.base_fraction,
            self.run.max_fraction,
            self.bike.base_fraction,
            self.bike.max_fraction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_default_brackets() {
        let table = ToleranceTable::loop_default();
        assert_eq!(table.tolerance(5.0), 0.05);
        assert_eq!(table.tolerance(8.0), 0.05);
        assert_eq!(table.tolerance(8.1), 0.08);
        assert_eq!(table.tolerance(35.0), 0.12);
        assert_eq!(table.tolerance(120.0), 0.15);
        assert!((table.tolerance_km(5.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn point_to_point_is_looser_than_loop() {
        let loop_table = ToleranceTable::loop_default();
        let p2p = ToleranceTable::point_to_point_default();
        for km in [3.0, 12.0, 40.0, 90.0] {
            assert!(p2p.tolerance(km) >= loop_table.tolerance(km), "{km}");
        }
    }

    #[test]
    fn parse_and_display_match_defaults() {
        let parsed: ToleranceTable = "8:0.05,20:0.08,50:0.12,*:0.15".parse().unwrap();
        assert_eq!(parsed, ToleranceTable::loop_default());
        assert_eq!(
            ToleranceTable::point_to_point_default().to_string(),
            "10:0.15,30:0.2,*:0.25"
        );
    }

    #[test]
    fn rejects_broken_invariants() {
        assert!("8:0.05,20:0.08".parse::<ToleranceTable>().is_err()); // no unbounded bracket
        assert!("20:0.05,8:0.08,*:0.1".parse::<ToleranceTable>().is_err()); // descending
        assert!("8:0.10,*:0.05".parse::<ToleranceTable>().is_err()); // tightening
        assert!("*:0.05,8:0.1".parse::<ToleranceTable>().is_err()); // unbounded not last
        assert!("8:1.5,*:2".parse::<ToleranceTable>().is_err());
        assert!("abc".parse::<ToleranceTable>().is_err());
    }

    #[test]
    fn search_radius_parse_overrides_only_named_modes() {
        let table: SearchRadiusTable = "bike=0.2/0.5".parse().unwrap();
        assert_eq!(table.bike.base_fraction, 0.2);
        assert_eq!(table.walk, SearchRadiusTable::default().walk);
        assert!("walk=0.4/0.2".parse::<SearchRadiusTable>().is_err());
        assert!("boat=0.1/0.2".parse::<SearchRadiusTable>().is_err());
    }

    #[test]
    fn search_radius_display_roundtrip() {
        let table = SearchRadiusTable::default();
        assert_eq!(table.to_string().parse::<SearchRadiusTable>().unwrap(), table);
    }

    #[test]
    fn radius_scales_with_target() {
        let walk = SearchRadiusTable::default().for_mode(&TransportMode::Walk);
        assert!((walk.base_radius_km(10.0) - 1.4).abs() < 1e-12);
        assert!(walk.max_radius_km(10.0) >= walk.base_radius_km(10.0));
    }
}
