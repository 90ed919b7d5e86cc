//! Lock-coordinated periodic driver
//!
//! Many workers may run the same scheduler against one shared store. Each
//! cycle takes a coarse lock around shard enumeration, then a short-TTL lock
//! per shard; a busy lock means another worker has the shard and it is
//! skipped until the next cycle.

mod lock;
mod maintenance;
mod registry;

pub use lock::{InMemoryLockService, LockClient, LockService};
pub use maintenance::{decay_relation_terms, ShardMaintenance, ShardReport};
pub use registry::{InMemoryRegistry, ShardRegistry};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::context::RealmContext;
use crate::core::calendar::Clock;
use crate::core::error::Result;
use crate::core::types::ShardId;

pub const ENUMERATION_LOCK: &str = "scheduler:enumerate";

pub fn shard_lock_key(shard: ShardId) -> String {
    format!("shard:{}", shard.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShardOutcome {
    Processed(ShardReport),
    /// Another worker holds the shard lock
    Busy,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    /// False when another worker was enumerating
    pub enumerated: bool,
    pub shards: Vec<(ShardId, ShardOutcome)>,
}

impl CycleReport {
    pub fn processed(&self) -> usize {
        self.shards.iter().filter(|(_, o)| matches!(o, ShardOutcome::Processed(_))).count()
    }

    pub fn outcome(&self, shard: ShardId) -> Option<&ShardOutcome> {
        self.shards.iter().find(|(s, _)| *s == shard).map(|(_, o)| o)
    }
}

pub struct ShardScheduler {
    registry: Arc<dyn ShardRegistry>,
    locks: LockClient,
    clock: Arc<dyn Clock>,
    ctx: RealmContext,
    maintenance: ShardMaintenance,
}

impl ShardScheduler {
    pub fn new(
        registry: Arc<dyn ShardRegistry>,
        locks: LockClient,
        clock: Arc<dyn Clock>,
        ctx: RealmContext,
    ) -> Self {
        Self {
            registry,
            locks,
            clock,
            ctx,
            maintenance: ShardMaintenance::new(),
        }
    }

    pub fn context(&self) -> &RealmContext {
        &self.ctx
    }

    /// Cycle number for the current time; every worker computes the same one
    pub fn current_cycle(&self) -> u64 {
        self.clock.now().millis() / self.ctx.config.scheduler.interval_ms.max(1)
    }

    /// Run one pass over every active shard
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let cycle = self.current_cycle();
        let sched = &self.ctx.config.scheduler;
        let mut report = CycleReport { cycle, enumerated: false, shards: Vec::new() };

        if !self.locks.acquire(ENUMERATION_LOCK, sched.enumeration_lock_ttl_ms).await? {
            debug!(cycle, "shard enumeration held elsewhere");
            return Ok(report);
        }
        let listed = self.registry.active_shards().await;
        if let Err(e) = self.locks.release(ENUMERATION_LOCK).await {
            warn!(error = %e, "failed to release enumeration lock");
        }
        let shards = listed?;
        report.enumerated = true;

        for shard in shards {
            let outcome = self.process_shard(shard, cycle).await;
            report.shards.push((shard, outcome));
        }

        Ok(report)
    }

    async fn process_shard(&self, shard: ShardId, cycle: u64) -> ShardOutcome {
        let key = shard_lock_key(shard);
        match self.locks.acquire(&key, self.ctx.config.scheduler.lock_ttl_ms).await {
            Ok(true) => {}
            Ok(false) => return ShardOutcome::Busy,
            Err(e) => {
                warn!(%shard, cycle, error = %e, "shard lock unavailable");
                return ShardOutcome::Failed(e.to_string());
            }
        }

        let result = match self.registry.store(shard).await {
            Ok(store) => {
                let now = self.clock.now();
                self.maintenance.run(store.as_ref(), &self.ctx, cycle, now).await
            }
            Err(e) => Err(e),
        };

        // released on every path so a failing shard does not sit on its lease
        if let Err(e) = self.locks.release(&key).await {
            warn!(%shard, error = %e, "failed to release shard lock");
        }

        match result {
            Ok(report) => ShardOutcome::Processed(report),
            Err(e) => {
                error!(%shard, cycle, error = %e, "shard maintenance failed");
                ShardOutcome::Failed(e.to_string())
            }
        }
    }

    /// Drive cycles on a fixed interval until `shutdown` flips to true or
    /// `max_cycles` have run; returns the number of cycles run
    pub async fn run(
        &self,
        max_cycles: Option<u64>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<u64> {
        let period = Duration::from_millis(self.ctx.config.scheduler.interval_ms);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut ran = 0u64;

        info!(
            interval_ms = self.ctx.config.scheduler.interval_ms,
            holder = self.locks.holder(),
            "scheduler started"
        );
        loop {
            if max_cycles.is_some_and(|max| ran >= max) || *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_cycle().await {
                        Ok(report) => {
                            let processed = report.processed();
                            debug!(cycle = report.cycle, processed, "cycle done")
                        }
                        Err(e) => error!(error = %e, "scheduler cycle failed"),
                    }
                    ran += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(cycles = ran, "scheduler stopped");
        Ok(ran)
    }
}

impl std::fmt::Debug for ShardScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardScheduler")
            .field("locks", &self.locks)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
