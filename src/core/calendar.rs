//! Game calendar and wall-clock time
//!
//! Two notions of time coexist: the turn date (year/month) that identifies a
//! game turn and feeds seed derivation, and the wall-clock timestamp used for
//! auction deadlines and lock expiry.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Turn date of a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameDate {
    pub year: u32,
    pub month: u32, // 1..=12
}

impl GameDate {
    pub fn new(year: u32, month: u32) -> Self {
        Self { year, month: month.clamp(1, 12) }
    }

    /// Advance by one turn (one month)
    pub fn advance(&mut self) {
        if self.month >= 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }

    /// Months elapsed since year 0, month 1
    pub fn ordinal(&self) -> u64 {
        self.year as u64 * 12 + (self.month as u64 - 1)
    }
}

impl Default for GameDate {
    fn default() -> Self {
        Self::new(180, 1)
    }
}

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const MINUTE_MS: u64 = 60_000;

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn millis(&self) -> u64 {
        self.0
    }

    pub fn plus_millis(&self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    pub fn plus_minutes(&self, minutes: u64) -> Self {
        self.plus_millis(minutes.saturating_mul(Self::MINUTE_MS))
    }

    /// Milliseconds from `self` until `later` (0 if already past)
    pub fn until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Real system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(ms)
    }
}

/// Manually advanced clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: AtomicU64::new(start.0) }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at.0, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_minutes(&self, minutes: u64) {
        self.advance_millis(minutes * Timestamp::MINUTE_MS);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_advances_through_year_end() {
        let mut date = GameDate::new(190, 11);
        date.advance();
        assert_eq!(date, GameDate::new(190, 12));
        date.advance();
        assert_eq!(date, GameDate::new(191, 1));
    }

    #[test]
    fn test_date_ordinal_is_monotonic() {
        let mut date = GameDate::new(200, 1);
        let mut last = date.ordinal();
        for _ in 0..30 {
            date.advance();
            assert_eq!(date.ordinal(), last + 1);
            last = date.ordinal();
        }
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Timestamp(1_000));
        clock.advance_minutes(2);
        assert_eq!(clock.now(), Timestamp(121_000));
        clock.set(Timestamp(5));
        assert_eq!(clock.now().millis(), 5);
    }

    #[test]
    fn test_timestamp_until() {
        let a = Timestamp(100);
        assert_eq!(a.until(Timestamp(250)), 150);
        assert_eq!(Timestamp(300).until(a), 0);
    }
}
