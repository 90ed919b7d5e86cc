//! Reproducible randomness
//!
//! Outcomes that must be auditable (conquest hooks, destruction losses,
//! neutral market listings) draw from streams derived from stable game
//! identifiers, so replaying the same turn replays the same draws.

pub mod seed;
pub mod stream;

pub use seed::{derive_seed, Seed, SeedDeriver, SeedPart};
pub use stream::{choice, DeterministicStream, GuardRng, RealmRng};

/// Derive a seed and wrap it in a stream in one step
pub fn new_stream(deriver: &SeedDeriver, label: &str, parts: &[SeedPart]) -> DeterministicStream {
    DeterministicStream::new(deriver.derive(label, parts))
}
