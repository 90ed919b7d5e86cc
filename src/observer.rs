//! Capability hooks on actors
//!
//! Special actors (unique traits, scenario characters) react to a fixed set
//! of game events. An actor either has an observer registered or it does
//! not; callers look it up and skip the hook when absent.

use ahash::AHashMap;
use std::sync::Arc;

use crate::core::types::{CityId, GeneralId, NationId};
use crate::random::RealmRng;
use crate::world::GeneralDelta;

/// Events that may trigger an arbitrary-action hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArbitraryAction {
    ConquerCity { city: CityId },
    DestroyNation { nation: NationId },
}

/// Nation-level commands subject to a cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategicCommand {
    DeclareWar,
    ProposeAlliance,
    ProposeNoAggression,
    ProposePeace,
}

/// Fixed set of hooks an actor may implement
pub trait GameEventObserver: Send + Sync {
    /// Called after the actor triggered `action`; the returned delta is applied to the actor
    fn on_arbitrary_action(
        &self,
        _action: ArbitraryAction,
        _rng: &mut dyn RealmRng,
    ) -> GeneralDelta {
        GeneralDelta::default()
    }

    /// Adjust the cooldown of a strategic command
    fn on_calc_strategic(&self, _command: StrategicCommand, base_delay: u32) -> u32 {
        base_delay
    }
}

/// Lookup table of actors carrying the observer capability
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    generals: AHashMap<GeneralId, Arc<dyn GameEventObserver>>,
    nations: AHashMap<NationId, Arc<dyn GameEventObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_general(&mut self, id: GeneralId, observer: Arc<dyn GameEventObserver>) {
        self.generals.insert(id, observer);
    }

    pub fn register_nation(&mut self, id: NationId, observer: Arc<dyn GameEventObserver>) {
        self.nations.insert(id, observer);
    }

    pub fn general(&self, id: GeneralId) -> Option<&dyn GameEventObserver> {
        self.generals.get(&id).map(|o| o.as_ref())
    }

    pub fn nation(&self, id: NationId) -> Option<&dyn GameEventObserver> {
        self.nations.get(&id).map(|o| o.as_ref())
    }
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("generals", &self.generals.len())
            .field("nations", &self.nations.len())
            .finish()
    }
}
