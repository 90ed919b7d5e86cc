//! Random draw streams
//!
//! `DeterministicStream` replays the same sequence for the same seed.
//! `GuardRng` is handed to code paths that must not need randomness; any
//! draw through it panics.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::seed::Seed;

/// Draw interface shared by every random source in the engine
pub trait RealmRng {
    /// Uniform integer in `0..max` (0 when `max` is 0)
    fn next_int(&mut self, max: u64) -> u64;

    /// Uniform integer in `min..=max`
    fn next_range_int(&mut self, min: i64, max: i64) -> i64;

    /// Uniform float in `min..max`
    fn next_range_float(&mut self, min: f64, max: f64) -> f64;

    /// True with probability `prob` (clamped into 0..=1)
    fn next_bool(&mut self, prob: f64) -> bool;

    /// Uniform index into a list of `len` items
    fn choice_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.next_int(len as u64) as usize)
        }
    }
}

/// Pick one element uniformly
pub fn choice<'a, T>(rng: &mut dyn RealmRng, items: &'a [T]) -> Option<&'a T> {
    rng.choice_index(items.len()).map(|i| &items[i])
}

/// Counter-based ChaCha stream seeded from a derived seed
#[derive(Debug, Clone)]
pub struct DeterministicStream {
    rng: ChaCha20Rng,
    draws: u64,
}

impl DeterministicStream {
    pub fn new(seed: Seed) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(seed),
            draws: 0,
        }
    }

    /// Number of draws taken so far (for audit logs)
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl RealmRng for DeterministicStream {
    fn next_int(&mut self, max: u64) -> u64 {
        self.draws += 1;
        if max == 0 {
            return 0;
        }
        self.rng.gen_range(0..max)
    }

    fn next_range_int(&mut self, min: i64, max: i64) -> i64 {
        self.draws += 1;
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn next_range_float(&mut self, min: f64, max: f64) -> f64 {
        self.draws += 1;
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    fn next_bool(&mut self, prob: f64) -> bool {
        self.draws += 1;
        self.rng.gen_bool(prob.clamp(0.0, 1.0))
    }
}

/// Random source for paths that were proven not to need randomness
#[derive(Debug, Clone, Copy)]
pub struct GuardRng {
    context: &'static str,
}

impl GuardRng {
    pub fn new(context: &'static str) -> Self {
        Self { context }
    }

    fn violation(&self, draw: &str) -> ! {
        panic!(
            "determinism violation: {} requested a random draw ({}) through the guard generator",
            self.context, draw
        )
    }
}

impl RealmRng for GuardRng {
    fn next_int(&mut self, _max: u64) -> u64 {
        self.violation("next_int")
    }

    fn next_range_int(&mut self, _min: i64, _max: i64) -> i64 {
        self.violation("next_range_int")
    }

    fn next_range_float(&mut self, _min: f64, _max: f64) -> f64 {
        self.violation("next_range_float")
    }

    fn next_bool(&mut self, _prob: f64) -> bool {
        self.violation("next_bool")
    }

    fn choice_index(&mut self, _len: usize) -> Option<usize> {
        self.violation("choice")
    }
}
