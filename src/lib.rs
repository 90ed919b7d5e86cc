//! Arc Realm - Deterministic world-event engine
//!
//! Reproducible, retry-safe mutations of a shared strategy world: conquest
//! resolution, post-battle aftermath, diplomacy terms, auctions, and the
//! lock-coordinated scheduler that drives periodic shard maintenance.

pub mod aftermath;
pub mod auction;
pub mod chronicle;
pub mod conquest;
pub mod context;
pub mod core;
pub mod diplomacy;
pub mod observer;
pub mod random;
pub mod scheduler;
pub mod store;
pub mod world;

pub use context::RealmContext;
