//! Relation states between two nations

use serde::{Deserialize, Serialize};

/// Diplomatic state, with the persisted numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RelationState {
    War = 0,
    Declaration = 1,
    Peace = 2,
    Alliance = 3,
    NoAggression = 7,
}

impl RelationState {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RelationState::War),
            1 => Some(RelationState::Declaration),
            2 => Some(RelationState::Peace),
            3 => Some(RelationState::Alliance),
            7 => Some(RelationState::NoAggression),
            _ => None,
        }
    }

    /// State a relation falls into when its term runs out
    pub fn on_term_expiry(&self) -> RelationState {
        match self {
            RelationState::Declaration => RelationState::War,
            RelationState::Alliance | RelationState::NoAggression => RelationState::Peace,
            RelationState::War => RelationState::War,
            RelationState::Peace => RelationState::Peace,
        }
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, RelationState::War | RelationState::Declaration)
    }
}

/// One directed relation `(me, you)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub state: RelationState,
    /// Turns remaining in the current state
    pub term: u32,
    /// Deaths `me` has suffered fighting `you` (monotonic)
    pub deaths: u64,
}

impl Default for Relation {
    fn default() -> Self {
        Self {
            state: RelationState::Peace,
            term: 0,
            deaths: 0,
        }
    }
}

impl Relation {
    pub fn new(state: RelationState, term: u32) -> Self {
        Self { state, term, deaths: 0 }
    }
}
