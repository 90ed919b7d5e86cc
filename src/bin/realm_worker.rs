//! Realm maintenance worker
//!
//! Runs the lock-coordinated scheduler against the shard registry. Several
//! workers may run side by side; the shard locks keep them from doing the
//! same work twice.

use std::path::PathBuf;
use std::sync::Arc;

use arc_realm::auction::{open_auction, AuctionHost, AuctionTerms};
use arc_realm::chronicle::ChronicleLog;
use arc_realm::core::calendar::{Clock, GameDate, SystemClock};
use arc_realm::core::error::Result;
use arc_realm::core::types::{CityId, GeneralId, NationId, ResourceType, ShardId};
use arc_realm::core::RealmConfig;
use arc_realm::diplomacy::RelationBook;
use arc_realm::scheduler::{InMemoryLockService, InMemoryRegistry, LockClient, ShardScheduler};
use arc_realm::store::{InMemoryStore, WorldSnapshot};
use arc_realm::world::{City, General, Nation};
use arc_realm::RealmContext;
use clap::Parser;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Realm worker - periodic shard maintenance
#[derive(Parser, Debug)]
#[command(name = "realm_worker")]
#[command(about = "Run auction settlement, diplomacy decay and market upkeep for every shard")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop after this many cycles (0 runs until Ctrl-C)
    #[arg(long, default_value_t = 0)]
    cycles: u64,

    /// Populate a small demo shard in memory
    #[arg(long, default_value_t = false)]
    seed_world: bool,

    /// Write the chronicle as JSON to this path on exit
    #[arg(long)]
    chronicle_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arc_realm=info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RealmConfig::load(path)?,
        None => RealmConfig::default(),
    };
    tracing::info!(config = ?args.config, cycles = args.cycles, "realm worker starting");

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: RealmConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let chronicle = Arc::new(ChronicleLog::new());
    let ctx = RealmContext::new(config).with_chronicle(chronicle.clone());

    let registry = Arc::new(InMemoryRegistry::new());
    if args.seed_world {
        let store = Arc::new(InMemoryStore::from_snapshot(ShardId(1), demo_world()));
        open_auction(
            store.as_ref(),
            &ctx,
            AuctionTerms::sell(
                AuctionHost::General(GeneralId(1)),
                ResourceType::Rice,
                ResourceType::Gold,
                1_000,
            )
            .with_bids(600, 1_300)
            .with_close_turns(1),
            clock.now(),
        )
        .await?;
        registry.insert(store).await;
        tracing::info!("demo shard seeded");
    }

    let locks = LockClient::new(Arc::new(InMemoryLockService::new(clock.clone())));
    let scheduler = ShardScheduler::new(registry, locks, clock, ctx);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = stop_tx.send(true);
        }
    });

    let max_cycles = (args.cycles > 0).then_some(args.cycles);
    let ran = scheduler.run(max_cycles, stop_rx).await?;
    tracing::info!(cycles = ran, entries = chronicle.len(), "realm worker finished");

    if let Some(path) = &args.chronicle_out {
        std::fs::write(path, chronicle.to_json()?)?;
        tracing::info!(path = %path.display(), "chronicle written");
    }
    Ok(())
}

/// Three nations with two cities each; Wei and Shu are counting down to war
fn demo_world() -> WorldSnapshot {
    let wei = NationId(1);
    let shu = NationId(2);
    let wu = NationId(3);

    let cities = vec![
        City::new(CityId(1), "Luoyang", wei, 8).with_population(120_000),
        City::new(CityId(2), "Xuchang", wei, 5).with_population(60_000).with_supply(true),
        City::new(CityId(3), "Chengdu", shu, 8).with_population(90_000),
        City::new(CityId(4), "Hanzhong", shu, 4).with_population(40_000).with_supply(true),
        City::new(CityId(5), "Jianye", wu, 8).with_population(100_000),
        City::new(CityId(6), "Chaisang", wu, 3).with_population(30_000),
    ];
    let nations = vec![
        Nation::new(wei, "Wei").with_capital(CityId(1)),
        Nation::new(shu, "Shu").with_capital(CityId(3)),
        Nation::new(wu, "Wu").with_capital(CityId(5)),
    ];
    let generals = vec![
        General::new(GeneralId(1), "Xun Yu", wei, CityId(1)).with_treasury(5_000, 5_000),
        General::new(GeneralId(2), "Zhuge Liang", shu, CityId(3)).with_treasury(5_000, 5_000),
        General::new(GeneralId(3), "Lu Su", wu, CityId(5)).with_treasury(5_000, 5_000),
    ];

    let mut relations = RelationBook::new();
    relations.initialize(&[wei, shu, wu]);
    relations.declare_war(wei, shu, 2);
    relations.form_alliance(shu, wu, 3);

    WorldSnapshot {
        date: GameDate::new(190, 1),
        cities,
        nations,
        generals,
        relations,
        auctions: Vec::new(),
    }
}
