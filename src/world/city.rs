//! Cities and contested-ownership scores

use serde::{Deserialize, Serialize};

use crate::core::types::{CityId, GeneralId, NationId};

/// A development track with a current value and a cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub current: u64,
    pub max: u64,
}

impl Track {
    pub fn new(current: u64, max: u64) -> Self {
        Self { current: current.min(max), max }
    }

    /// Scale the current value by `percent`, rounding down
    pub fn scale_percent(&mut self, percent: u64) {
        self.current = self.current * percent / 100;
    }

    /// Reset to a baseline, never above the cap
    pub fn reset_to(&mut self, value: u64) {
        self.current = value.min(self.max);
    }
}

/// Per-nation accumulated contest score on a city
///
/// Kept as an ordered list rather than a map: when two nations tie for the
/// lead, the one that started contesting first takes the city.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictScores {
    entries: Vec<(NationId, u64)>,
}

impl ConflictScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a nation's score, appending it if it is new
    pub fn add(&mut self, nation: NationId, score: u64) {
        match self.entries.iter_mut().find(|(n, _)| *n == nation) {
            Some((_, s)) => *s = s.saturating_add(score),
            None => self.entries.push((nation, score)),
        }
    }

    /// Highest score, earliest entry on ties
    pub fn leader(&self) -> Option<NationId> {
        let mut best: Option<(NationId, u64)> = None;
        for &(nation, score) in &self.entries {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((nation, score)),
            }
        }
        best.map(|(n, _)| n)
    }

    pub fn score(&self, nation: NationId) -> u64 {
        self.entries
            .iter()
            .find(|(n, _)| *n == nation)
            .map(|(_, s)| *s)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NationId, u64)> {
        self.entries.iter()
    }
}

/// A city on the world map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub nation: NationId,
    /// Tier 0..=10; levels above the small-city threshold get a fixed garrison baseline
    pub level: u8,
    pub population: u64,
    pub trust: u32,
    pub agriculture: Track,
    pub commerce: Track,
    pub security: Track,
    pub defense: Track,
    pub wall: Track,
    pub conflict: ConflictScores,
    /// Logistics hub flag
    pub supply: bool,
    /// City-level officer assignments
    pub officers: Vec<GeneralId>,
    /// Monotonic casualty counter
    pub dead: u64,
}

impl City {
    pub fn new(id: CityId, name: impl Into<String>, nation: NationId, level: u8) -> Self {
        Self {
            id,
            name: name.into(),
            nation,
            level: level.min(10),
            population: 10_000,
            trust: 50,
            agriculture: Track::new(1_000, 2_000),
            commerce: Track::new(1_000, 2_000),
            security: Track::new(1_000, 2_000),
            defense: Track::new(1_000, 2_000),
            wall: Track::new(1_000, 2_000),
            conflict: ConflictScores::new(),
            supply: false,
            officers: Vec::new(),
            dead: 0,
        }
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }

    pub fn with_supply(mut self, supply: bool) -> Self {
        self.supply = supply;
        self
    }

    pub fn is_owned(&self) -> bool {
        !self.nation.is_neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leader_highest_score() {
        let mut c = ConflictScores::new();
        c.add(NationId(3), 100);
        c.add(NationId(1), 250);
        c.add(NationId(2), 50);
        assert_eq!(c.leader(), Some(NationId(1)));
    }

    #[test]
    fn test_leader_tie_goes_to_first_inserted() {
        let mut c = ConflictScores::new();
        c.add(NationId(9), 300);
        c.add(NationId(2), 300);
        assert_eq!(c.leader(), Some(NationId(9)));

        // Accumulating into an existing entry keeps its position
        let mut c = ConflictScores::new();
        c.add(NationId(5), 100);
        c.add(NationId(1), 200);
        c.add(NationId(5), 100);
        assert_eq!(c.score(NationId(5)), 200);
        assert_eq!(c.leader(), Some(NationId(5)));
    }

    #[test]
    fn test_empty_conflict_has_no_leader() {
        assert_eq!(ConflictScores::new().leader(), None);
    }

    #[test]
    fn test_track_scale_rounds_down() {
        let mut t = Track::new(999, 2000);
        t.scale_percent(70);
        assert_eq!(t.current, 699);
    }

    #[test]
    fn test_track_reset_respects_max() {
        let mut t = Track::new(10, 500);
        t.reset_to(1000);
        assert_eq!(t.current, 500);
    }
}
