//! Explicit settings and collaborators handed to every engine entry point

use std::sync::Arc;

use crate::chronicle::{Chronicle, NullChronicle};
use crate::core::calendar::GameDate;
use crate::core::config::RealmConfig;
use crate::observer::ObserverRegistry;
use crate::random::{DeterministicStream, SeedDeriver, SeedPart};

#[derive(Clone)]
pub struct RealmContext {
    pub config: RealmConfig,
    pub seeds: SeedDeriver,
    pub observers: ObserverRegistry,
    pub chronicle: Arc<dyn Chronicle>,
}

impl RealmContext {
    pub fn new(config: RealmConfig) -> Self {
        Self {
            config,
            seeds: SeedDeriver::default(),
            observers: ObserverRegistry::new(),
            chronicle: Arc::new(NullChronicle),
        }
    }

    pub fn with_seeds(mut self, seeds: SeedDeriver) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_observers(mut self, observers: ObserverRegistry) -> Self {
        self.observers = observers;
        self
    }

    pub fn with_chronicle(mut self, chronicle: Arc<dyn Chronicle>) -> Self {
        self.chronicle = chronicle;
        self
    }

    /// Stream for a turn-scoped action: `label, year, month, parts...`
    pub fn turn_stream(
        &self,
        label: &str,
        date: GameDate,
        parts: &[SeedPart],
    ) -> DeterministicStream {
        DeterministicStream::new(self.seeds.derive_for_turn(label, date, parts))
    }
}

impl Default for RealmContext {
    fn default() -> Self {
        Self::new(RealmConfig::default())
    }
}

impl std::fmt::Debug for RealmContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmContext")
            .field("config", &self.config)
            .field("seeds", &self.seeds)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}
