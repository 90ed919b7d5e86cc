//! Store-backed conquest resolution

use tracing::{error, info, warn};

use super::plan::{plan_conquest, ConquestInput, ConquestPlan};
use crate::chronicle::ChronicleEvent;
use crate::context::RealmContext;
use crate::core::calendar::GameDate;
use crate::core::error::{RealmError, Result};
use crate::core::types::{CityId, GeneralId, NationId};
use crate::observer::ArbitraryAction;
use crate::random::GuardRng;
use crate::store::WorldStore;
use crate::world::{General, GeneralDelta, WorldMap};

/// What the caller gets back from a completed conquest
#[derive(Debug, Clone, PartialEq)]
pub struct ConquestResult {
    pub previous_owner: NationId,
    pub new_owner: NationId,
    pub actor_moved: bool,
    /// The caller runs `destroy_nation` when this is set
    pub nation_destroyed: bool,
    pub new_capital: Option<CityId>,
    pub capital_relocated: bool,
    /// Defenders that fell back to their capital
    pub retreated: Vec<GeneralId>,
}

/// Resolve the conquest of `city` by `attacker`
///
/// Any failed write after planning surfaces as
/// [`RealmError::ConquestPersistence`]; the conquest is then not complete and
/// the caller owns retry and alerting.
pub async fn resolve_conquest(
    store: &dyn WorldStore,
    map: &dyn WorldMap,
    ctx: &RealmContext,
    attacker: GeneralId,
    city: CityId,
    defenders: &[GeneralId],
) -> Result<ConquestResult> {
    let date = store.date().await?;
    let actor = store.general(attacker).await?;
    let target = store.city(city).await?;

    let (defender, defender_cities) = if target.is_owned() {
        let nation = store.nation(target.nation).await?;
        let cities = store.cities_of_nation(nation.id).await?;
        (Some(nation), cities)
    } else {
        (None, Vec::new())
    };

    let mut present = Vec::with_capacity(defenders.len());
    for id in defenders {
        present.push(store.general(*id).await?);
    }

    let input = ConquestInput {
        attacker: &actor,
        city: &target,
        defender: defender.as_ref(),
        defender_cities: &defender_cities,
    };
    // only a lost capital can draw, to break a relocation tie
    let loses_capital = defender.as_ref().is_some_and(|n| n.capital == Some(city));
    let plan = if loses_capital {
        let mut rng =
            ctx.turn_stream("RelocateCapital", date, &[target.nation.into(), city.into()]);
        plan_conquest(input, map, &ctx.config.battle, &mut rng)?
    } else {
        let mut guard = GuardRng::new("conquest of a non-capital city");
        plan_conquest(input, map, &ctx.config.battle, &mut guard)?
    };

    match persist(store, ctx, date, &actor, &present, &plan).await {
        Ok(result) => {
            info!(
                city = %city,
                from = %plan.previous_owner,
                to = %plan.new_owner,
                destroyed = plan.nation_destroyed,
                "city conquered"
            );
            Ok(result)
        }
        Err(source) => {
            error!(city = %city, error = %source, "conquest persistence failed");
            Err(RealmError::ConquestPersistence { city, source: Box::new(source) })
        }
    }
}

async fn persist(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    date: GameDate,
    actor: &General,
    present: &[General],
    plan: &ConquestPlan,
) -> Result<ConquestResult> {
    let city = plan.city.id;
    store.save_city(&plan.city).await?;

    let mut new_capital = None;
    if let Some(relocation) = &plan.relocation {
        if let Some(to) = relocation.to {
            store.set_city_supply(to, true).await?;
        } else {
            warn!(nation = %relocation.nation, "no reachable city for a new capital");
        }
        store.adjust_nation(relocation.nation, relocation.penalty).await?;
        store.set_nation_capital(relocation.nation, relocation.to).await?;
        new_capital = relocation.to;
    }

    if plan.actor_moves {
        store.move_general(actor.id, city).await?;
    }

    // defenders of a surviving nation fall back to its capital
    let mut retreated = Vec::new();
    if !plan.nation_destroyed && !plan.previous_owner.is_neutral() {
        let fallback = match new_capital {
            Some(capital) => Some(capital),
            None => store.nation(plan.previous_owner).await?.capital.filter(|c| *c != city),
        };
        if let Some(fallback) = fallback {
            let stranded = present
                .iter()
                .filter(|g| g.nation == plan.previous_owner && g.city == city);
            for general in stranded {
                store.move_general(general.id, fallback).await?;
                retreated.push(general.id);
            }
        }
    }

    if let Some(observer) = ctx.observers.general(actor.id) {
        let mut rng = ctx.turn_stream("ConquerCity", date, &[actor.id.into(), city.into()]);
        let delta = observer.on_arbitrary_action(ArbitraryAction::ConquerCity { city }, &mut rng);
        if delta != GeneralDelta::default() {
            store.adjust_general(actor.id, delta).await?;
        }
    }

    let shard = store.shard();
    ctx.chronicle.record(shard, date, ChronicleEvent::ConquestSucceeded {
        general: actor.id,
        city,
        nation: actor.nation,
    });
    ctx.chronicle.record(shard, date, ChronicleEvent::CityChangedHands {
        city,
        from: plan.previous_owner,
        to: plan.new_owner,
    });
    if let Some(relocation) = &plan.relocation {
        ctx.chronicle.record(shard, date, ChronicleEvent::CapitalRelocated {
            nation: relocation.nation,
            from: relocation.from,
            to: relocation.to,
        });
    }

    Ok(ConquestResult {
        previous_owner: plan.previous_owner,
        new_owner: plan.new_owner,
        actor_moved: plan.actor_moves,
        nation_destroyed: plan.nation_destroyed,
        new_capital,
        capital_relocated: plan.relocation.is_some(),
        retreated,
    })
}
