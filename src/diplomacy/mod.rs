//! Bilateral diplomacy state machine

mod book;
mod relation;

pub use book::{DecayReport, RelationBook, WarStats};
pub use relation::{Relation, RelationState};
