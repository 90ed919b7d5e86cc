//! Persistence port
//!
//! Every numeric change to a nation or general goes through a relative delta
//! so concurrent writers compose regardless of order. Whole-record writes are
//! limited to the conquest reset of a single city.

mod memory;

pub use memory::{InMemoryStore, WorldSnapshot};

use async_trait::async_trait;

use crate::auction::{Auction, Bid, Settlement};
use crate::core::calendar::GameDate;
use crate::core::error::Result;
use crate::core::types::{AuctionId, CityId, GeneralId, NationId, ShardId};
use crate::diplomacy::{DecayReport, RelationBook};
use crate::world::{City, General, GeneralDelta, Nation, NationDelta};

/// Store operations that can be targeted by fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    LoadCity,
    LoadNation,
    LoadGeneral,
    SaveCity,
    AddCityDeaths,
    SetCitySupply,
    AdjustNation,
    SetCapital,
    DestroyNation,
    TickCooldowns,
    AdjustGeneral,
    MoveGeneral,
    ReleaseGeneral,
    Relations,
    InsertAuction,
    CommitBid,
    CommitSettlement,
    ListAuctions,
}

#[async_trait]
pub trait WorldStore: Send + Sync {
    fn shard(&self) -> ShardId;

    /// Current game turn
    async fn date(&self) -> Result<GameDate>;

    async fn city(&self, id: CityId) -> Result<City>;
    async fn nation(&self, id: NationId) -> Result<Nation>;
    async fn general(&self, id: GeneralId) -> Result<General>;
    async fn nations(&self) -> Result<Vec<Nation>>;
    async fn cities_of_nation(&self, nation: NationId) -> Result<Vec<City>>;
    async fn generals_of_nation(&self, nation: NationId) -> Result<Vec<General>>;

    /// Overwrite a city (conquest reset)
    async fn save_city(&self, city: &City) -> Result<()>;
    async fn add_city_deaths(&self, id: CityId, deaths: u64) -> Result<()>;
    async fn set_city_supply(&self, id: CityId, supply: bool) -> Result<()>;

    async fn adjust_nation(&self, id: NationId, delta: NationDelta) -> Result<()>;
    async fn set_nation_capital(&self, id: NationId, capital: Option<CityId>) -> Result<()>;
    /// Returns false if the nation was already destroyed
    async fn mark_nation_destroyed(&self, id: NationId) -> Result<bool>;

    async fn adjust_general(&self, id: GeneralId, delta: GeneralDelta) -> Result<()>;
    async fn move_general(&self, id: GeneralId, city: CityId) -> Result<()>;
    /// Apply `loss` and move the general to the neutral nation in one step
    async fn release_general(&self, id: GeneralId, loss: GeneralDelta) -> Result<()>;

    /// Snapshot of the relation book
    async fn relations(&self) -> Result<RelationBook>;
    async fn record_battle_deaths(&self, me: NationId, you: NationId, deaths: u64) -> Result<()>;
    /// One turn of treaty-term decay plus strategic cooldown ticks, applied
    /// together and at most once per `key`. Returns the decay and how many
    /// cooldowns reached zero.
    async fn decay_turn(&self, key: u64) -> Result<(DecayReport, usize)>;
    async fn remove_nation_relations(&self, nation: NationId) -> Result<usize>;

    async fn next_auction_id(&self) -> Result<AuctionId>;
    async fn auction(&self, id: AuctionId) -> Result<Auction>;
    async fn open_auctions(&self) -> Result<Vec<Auction>>;
    /// Insert a new auction and debit the host's escrow in one step
    async fn insert_auction(&self, auction: &Auction) -> Result<()>;
    /// Store `auction` (already carrying `bid`) and debit the bid's hold,
    /// provided the stored version is still `auction.version - 1`
    async fn commit_bid(&self, auction: &Auction, bid: &Bid) -> Result<()>;
    /// Apply every credit and mark the auction finished in one step.
    /// Returns false when the auction was already finished.
    async fn commit_settlement(&self, settlement: &Settlement) -> Result<bool>;
}
