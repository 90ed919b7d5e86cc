//! The five aftermath stages
//!
//! Each stage touches its own ledger and reports through `StageEffect`; the
//! pipeline isolates their failures.

use super::{BattleOutcome, BattleReport, Participants, StageEffect};
use crate::context::RealmContext;
use crate::core::error::Result;
use crate::store::WorldStore;
use crate::world::{GeneralDelta, NationDelta};

/// Experience / dedication deltas for (attacker, each defender)
pub fn reward_deltas(outcome: BattleOutcome) -> Option<(GeneralDelta, GeneralDelta)> {
    match outcome {
        BattleOutcome::AttackerVictory => {
            Some((GeneralDelta::merit(1_000, 500), GeneralDelta::merit(-100, -50)))
        }
        BattleOutcome::DefenderVictory => {
            Some((GeneralDelta::merit(-50, -25), GeneralDelta::merit(500, 250)))
        }
        BattleOutcome::Draw => None,
    }
}

/// Attacker's city takes 40% of the combined deaths, the defender's city the rest
pub fn casualty_split(total: u64) -> (u64, u64) {
    let attacker = total.saturating_mul(40) / 100;
    (attacker, total - attacker)
}

/// Tech gained from inflicting `deaths`, diluted across the nation's generals
pub fn tech_gain(deaths: u64, rate: f64, general_count: u32, min_divisor: u32) -> f64 {
    deaths as f64 * rate / general_count.max(min_divisor).max(1) as f64
}

/// Rice a supply hub burns while holding out
pub fn supply_cost(defender_deaths: u64, tech: f64) -> u64 {
    let base = defender_deaths as f64 / 100.0 * 0.8;
    let tech_scale = 1.0 + (tech / 1_000.0).floor() * 0.15;
    (base * tech_scale * 0.8).floor().max(0.0) as u64
}

pub(super) async fn casualties(
    store: &dyn WorldStore,
    report: &BattleReport,
    parties: &Participants,
) -> Result<StageEffect> {
    let total = report.attacker_deaths.saturating_add(report.defender_deaths);
    if total == 0 {
        return Ok(StageEffect::Skipped("no casualties"));
    }
    let (at_attacker, at_defender) = casualty_split(total);
    store.add_city_deaths(parties.attacker_city, at_attacker).await?;
    store.add_city_deaths(parties.defender_city, at_defender).await?;
    Ok(StageEffect::Applied)
}

pub(super) async fn technology(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    report: &BattleReport,
    parties: &Participants,
) -> Result<StageEffect> {
    let battle = &ctx.config.battle;
    let mut applied = false;

    if !parties.attacker_nation.is_neutral() {
        let nation = store.nation(parties.attacker_nation).await?;
        let gain = tech_gain(
            report.defender_deaths,
            battle.attacker_tech_rate,
            nation.general_count,
            battle.min_general_divisor,
        );
        store.adjust_nation(nation.id, NationDelta::tech(gain)).await?;
        applied = true;
    }
    if !parties.defender_nation.is_neutral() {
        let nation = store.nation(parties.defender_nation).await?;
        let gain = tech_gain(
            report.attacker_deaths,
            battle.defender_tech_rate,
            nation.general_count,
            battle.min_general_divisor,
        );
        store.adjust_nation(nation.id, NationDelta::tech(gain)).await?;
        applied = true;
    }

    Ok(if applied { StageEffect::Applied } else { StageEffect::Skipped("no affiliated side") })
}

pub(super) async fn diplomacy(
    store: &dyn WorldStore,
    report: &BattleReport,
    parties: &Participants,
) -> Result<StageEffect> {
    if parties.defender_nation.is_neutral() || parties.attacker_nation.is_neutral() {
        return Ok(StageEffect::Skipped("unaffiliated side"));
    }
    let (attacker, defender) = (parties.attacker_nation, parties.defender_nation);
    store.record_battle_deaths(attacker, defender, report.attacker_deaths).await?;
    store.record_battle_deaths(defender, attacker, report.defender_deaths).await?;
    Ok(StageEffect::Applied)
}

pub(super) async fn supply(
    store: &dyn WorldStore,
    report: &BattleReport,
    parties: &Participants,
) -> Result<StageEffect> {
    if parties.defender_nation.is_neutral() {
        return Ok(StageEffect::Skipped("unaffiliated defender"));
    }
    let city = store.city(parties.defender_city).await?;
    if !city.supply {
        return Ok(StageEffect::Skipped("not a supply hub"));
    }

    if report.conquered {
        let remaining = store.cities_of_nation(parties.defender_nation).await?.len();
        if remaining == 0 {
            return Ok(StageEffect::Skipped("defender destroyed"));
        }
        let bonus = if remaining == 1 { 1_000 } else { 500 };
        store.adjust_nation(parties.defender_nation, NationDelta::rice(bonus)).await?;
        return Ok(StageEffect::Applied);
    }

    if report.turns == 0 {
        return Ok(StageEffect::Skipped("no turns fought"));
    }
    let nation = store.nation(parties.defender_nation).await?;
    let cost = supply_cost(report.defender_deaths, nation.tech);
    if cost == 0 {
        return Ok(StageEffect::Skipped("nothing consumed"));
    }
    store.adjust_nation(nation.id, NationDelta::rice(-(cost as i64))).await?;
    Ok(StageEffect::Applied)
}

pub(super) async fn rewards(
    store: &dyn WorldStore,
    report: &BattleReport,
    parties: &Participants,
) -> Result<StageEffect> {
    let Some((attacker, defender)) = reward_deltas(report.outcome) else {
        return Ok(StageEffect::Skipped("draw"));
    };
    store.adjust_general(parties.attacker, attacker).await?;
    for id in &parties.defenders {
        store.adjust_general(*id, defender).await?;
    }
    Ok(StageEffect::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casualty_split_conserves_total() {
        assert_eq!(casualty_split(1_000), (400, 600));
        assert_eq!(casualty_split(7), (2, 5));
        assert_eq!(casualty_split(0), (0, 0));
    }

    #[test]
    fn test_tech_gain_uses_min_divisor() {
        assert!((tech_gain(1_000, 0.012, 3, 10) - 1.2).abs() < 1e-9);
        assert!((tech_gain(1_000, 0.012, 20, 10) - 0.6).abs() < 1e-9);
        assert_eq!(tech_gain(0, 0.009, 5, 10), 0.0);
    }

    #[test]
    fn test_supply_cost_tech_scaling() {
        // 5000 deaths: 50 * 0.8 = 40, * 0.8 = 32
        assert_eq!(supply_cost(5_000, 0.0), 32);
        assert_eq!(supply_cost(5_000, 999.0), 32);
        // tech 2000: scale 1.3 -> 41.6
        assert_eq!(supply_cost(5_000, 2_000.0), 41);
    }

    #[test]
    fn test_reward_table() {
        let (a, d) = reward_deltas(BattleOutcome::AttackerVictory).unwrap();
        assert_eq!((a.experience, a.dedication), (1_000, 500));
        assert_eq!((d.experience, d.dedication), (-100, -50));
        let (a, d) = reward_deltas(BattleOutcome::DefenderVictory).unwrap();
        assert_eq!((a.experience, a.dedication), (-50, -25));
        assert_eq!((d.experience, d.dedication), (500, 250));
        assert!(reward_deltas(BattleOutcome::Draw).is_none());
    }
}
