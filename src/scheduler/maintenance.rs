//! Periodic work for one shard
//!
//! Every step is safe to repeat for the same cycle: finalization skips
//! finished auctions, and decay plus cooldown ticks are keyed by cycle.
//! Auction settlement and relation decay touch disjoint records, so a
//! stuck auction never holds back decay.

use tracing::{debug, info, warn};

use crate::auction::{finalize_due_auctions, NeutralMarket};
use crate::chronicle::ChronicleEvent;
use crate::context::RealmContext;
use crate::core::calendar::Timestamp;
use crate::core::error::Result;
use crate::core::types::{AuctionId, ShardId};
use crate::diplomacy::DecayReport;
use crate::store::WorldStore;

#[derive(Debug, Clone, PartialEq)]
pub struct ShardReport {
    pub shard: ShardId,
    pub auctions_settled: usize,
    /// Due auctions that failed to settle and stay open for the next cycle
    pub auctions_failed: Vec<(AuctionId, String)>,
    pub decay: DecayReport,
    pub cooldowns_ready: usize,
    pub listings_opened: Vec<AuctionId>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShardMaintenance {
    market: NeutralMarket,
}

impl ShardMaintenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run(
        &self,
        store: &dyn WorldStore,
        ctx: &RealmContext,
        cycle: u64,
        now: Timestamp,
    ) -> Result<ShardReport> {
        let shard = store.shard();
        let sweep = finalize_due_auctions(store, ctx, now).await;
        // decay runs even when the auction listing itself failed
        let (decay, cooldowns_ready) = decay_relation_terms(store, ctx, cycle).await?;
        let sweep = sweep?;
        let listings_opened = self.market.replenish(store, ctx, cycle, now).await?;
        let report = ShardReport {
            shard,
            auctions_settled: sweep.settled.len(),
            auctions_failed: sweep.failed,
            decay,
            cooldowns_ready,
            listings_opened,
        };
        if !report.auctions_failed.is_empty() {
            warn!(
                %shard,
                cycle,
                failed = report.auctions_failed.len(),
                "some due auctions did not settle"
            );
        }

        info!(
            %shard,
            cycle,
            settled = report.auctions_settled,
            wars = report.decay.wars_started.len(),
            listings = report.listings_opened.len(),
            "shard maintenance done"
        );
        Ok(report)
    }
}

/// One turn of treaty terms and strategic cooldowns for the shard, keyed by `cycle`
///
/// Decay and the cooldown tick commit together, so a repeat call for the
/// same cycle reports `skipped` and a failed call leaves both untouched.
pub async fn decay_relation_terms(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    cycle: u64,
) -> Result<(DecayReport, usize)> {
    let shard = store.shard();
    let (decay, ready) = store.decay_turn(cycle).await?;
    if decay.skipped {
        debug!(%shard, cycle, "relation decay already applied this cycle");
        return Ok((decay, 0));
    }

    let date = store.date().await?;
    for &(a, b) in &decay.wars_started {
        ctx.chronicle.record(shard, date, ChronicleEvent::WarStarted { a, b });
    }
    for &(a, b, treaty) in &decay.treaties_expired {
        ctx.chronicle.record(shard, date, ChronicleEvent::TreatyExpired { a, b, treaty });
    }
    Ok((decay, ready))
}
