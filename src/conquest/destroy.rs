//! Nation destruction cascade
//!
//! Runs after a conquest flagged the defender as destroyed. Each write is
//! ordered so that a re-run after an abandoned attempt never pays out twice:
//! a general's loss and release land in one write, the treasury is emptied
//! before the conqueror is paid, and the conqueror's hook only fires once the
//! destroyed flag is committed.

use tracing::{debug, info};

use crate::chronicle::ChronicleEvent;
use crate::context::RealmContext;
use crate::core::error::Result;
use crate::core::types::{GeneralId, NationId, Treasury};
use crate::observer::ArbitraryAction;
use crate::random::RealmRng;
use crate::store::WorldStore;
use crate::world::{GeneralDelta, NationDelta};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestructionReport {
    pub nation: NationId,
    /// Set when the cascade had already completed; nothing was changed
    pub already_destroyed: bool,
    /// Generals released to the neutral nation, with the losses they took
    pub released: Vec<(GeneralId, GeneralDelta)>,
    /// Treasury share handed to the conqueror's nation
    pub spoils: Treasury,
    pub relations_removed: usize,
}

/// Loss percentage (20..=50) for one released general
pub fn release_loss(rng: &mut dyn RealmRng, treasury: Treasury) -> GeneralDelta {
    let percent = rng.next_range_int(20, 50) as u64;
    GeneralDelta::resources(
        -((treasury.gold * percent / 100) as i64),
        -((treasury.rice * percent / 100) as i64),
    )
}

/// Tear down `destroyed` after `conqueror` took its last city
pub async fn destroy_nation(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    destroyed: NationId,
    conqueror: GeneralId,
) -> Result<DestructionReport> {
    let mut report = DestructionReport { nation: destroyed, ..Default::default() };
    let nation = store.nation(destroyed).await?;
    if nation.destroyed || destroyed.is_neutral() {
        report.already_destroyed = true;
        return Ok(report);
    }

    let date = store.date().await?;
    let victor = store.general(conqueror).await?;

    for general in store.generals_of_nation(destroyed).await? {
        let mut rng =
            ctx.turn_stream("DestroyNation", date, &[destroyed.into(), general.id.into()]);
        let loss = release_loss(&mut rng, general.treasury);
        store.release_general(general.id, loss).await?;
        debug!(general = %general.id, gold = loss.gold, rice = loss.rice, "general released");
        report.released.push((general.id, loss));
    }

    let t = nation.treasury;
    store
        .adjust_nation(destroyed, NationDelta {
            gold: -(t.gold as i64),
            rice: -(t.rice as i64),
            general_count: -(nation.general_count as i64),
            ..Default::default()
        })
        .await?;
    if !victor.nation.is_neutral() {
        report.spoils = Treasury::new(t.gold / 2, t.rice / 2);
        store
            .adjust_nation(victor.nation, NationDelta {
                gold: report.spoils.gold as i64,
                rice: report.spoils.rice as i64,
                ..Default::default()
            })
            .await?;
    }

    report.relations_removed = store.remove_nation_relations(destroyed).await?;

    if !store.mark_nation_destroyed(destroyed).await? {
        // a concurrent run committed the destruction first
        return Ok(report);
    }
    info!(
        nation = %destroyed,
        by = %victor.nation,
        released = report.released.len(),
        "nation destroyed"
    );
    ctx.chronicle.record(store.shard(), date, ChronicleEvent::NationDestroyed {
        nation: destroyed,
        by: victor.nation,
    });

    if let Some(observer) = ctx.observers.general(conqueror) {
        let mut rng =
            ctx.turn_stream("DestroyNationBy", date, &[destroyed.into(), conqueror.into()]);
        let action = ArbitraryAction::DestroyNation { nation: destroyed };
        let delta = observer.on_arbitrary_action(action, &mut rng);
        if delta != GeneralDelta::default() {
            store.adjust_general(conqueror, delta).await?;
        }
    }
    Ok(report)
}
