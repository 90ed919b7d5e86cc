//! Post-battle aftermath pipeline
//!
//! Five stages run in a fixed order after every battle. They write disjoint
//! ledgers, so a failing stage is recorded and the rest still run.

mod population;
mod stages;

pub use population::calculate_population_trust;
pub use stages::{casualty_split, reward_deltas, supply_cost, tech_gain};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::RealmContext;
use crate::core::types::{CityId, GeneralId, NationId};
use crate::store::WorldStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    AttackerVictory,
    DefenderVictory,
    Draw,
}

/// What the battle engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    /// Deaths suffered by the attacking side
    pub attacker_deaths: u64,
    /// Deaths suffered by the defending side
    pub defender_deaths: u64,
    /// Turns fought
    pub turns: u32,
    /// Whether the defending city fell
    pub conquered: bool,
}

/// Who fought where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub attacker: GeneralId,
    pub attacker_nation: NationId,
    /// City the attack was staged from
    pub attacker_city: CityId,
    pub defender_nation: NationId,
    pub defender_city: CityId,
    /// Defending generals present in the city
    pub defenders: Vec<GeneralId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Casualties,
    Technology,
    Diplomacy,
    Supply,
    Rewards,
}

impl StageKind {
    pub const ORDER: [StageKind; 5] = [
        StageKind::Casualties,
        StageKind::Technology,
        StageKind::Diplomacy,
        StageKind::Supply,
        StageKind::Rewards,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Casualties => "casualties",
            StageKind::Technology => "technology",
            StageKind::Diplomacy => "diplomacy",
            StageKind::Supply => "supply",
            StageKind::Rewards => "rewards",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEffect {
    Applied,
    /// Stage did not apply to this battle
    Skipped(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} stage failed: {reason}")]
pub struct StageError {
    pub stage: StageKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub stage: StageKind,
    pub outcome: Result<StageEffect, StageError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AftermathReport {
    pub stages: Vec<StageResult>,
}

impl AftermathReport {
    pub fn stage(&self, kind: StageKind) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    pub fn failures(&self) -> Vec<&StageError> {
        self.stages.iter().filter_map(|s| s.outcome.as_ref().err()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.stages.len() == StageKind::ORDER.len() && self.failures().is_empty()
    }
}

/// Run every stage for one battle
pub async fn run_post_battle_aftermath(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    report: &BattleReport,
    parties: &Participants,
) -> AftermathReport {
    let mut out = AftermathReport::default();

    for stage in StageKind::ORDER {
        let result = match stage {
            StageKind::Casualties => stages::casualties(store, report, parties).await,
            StageKind::Technology => stages::technology(store, ctx, report, parties).await,
            StageKind::Diplomacy => stages::diplomacy(store, report, parties).await,
            StageKind::Supply => stages::supply(store, report, parties).await,
            StageKind::Rewards => stages::rewards(store, report, parties).await,
        };

        let outcome = match result {
            Ok(effect) => {
                debug!(%stage, ?effect, "aftermath stage done");
                Ok(effect)
            }
            Err(e) => {
                warn!(%stage, error = %e, "aftermath stage failed");
                Err(StageError { stage, reason: e.to_string() })
            }
        };
        out.stages.push(StageResult { stage, outcome });
    }

    out
}
