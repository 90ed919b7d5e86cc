//! In-memory `WorldStore` for tests and the demo worker

use ahash::{AHashMap, AHashSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{StoreOp, WorldStore};
use crate::auction::{Auction, Bid, Settlement};
use crate::core::calendar::GameDate;
use crate::core::error::{RealmError, Result, ValidationError};
use crate::core::types::{AuctionId, CityId, GeneralId, NationId, ResourceType, ShardId};
use crate::diplomacy::{DecayReport, RelationBook};
use crate::world::{City, General, GeneralDelta, Nation, NationDelta};

/// Plain-data contents of one shard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub date: GameDate,
    pub cities: Vec<City>,
    pub nations: Vec<Nation>,
    pub generals: Vec<General>,
    pub relations: RelationBook,
    pub auctions: Vec<Auction>,
}

impl WorldSnapshot {
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    pub fn nation(&self, id: NationId) -> Option<&Nation> {
        self.nations.iter().find(|n| n.id == id)
    }

    pub fn general(&self, id: GeneralId) -> Option<&General> {
        self.generals.iter().find(|g| g.id == id)
    }
}

#[derive(Debug, Default)]
struct Tables {
    date: GameDate,
    cities: AHashMap<CityId, City>,
    nations: AHashMap<NationId, Nation>,
    generals: AHashMap<GeneralId, General>,
    relations: RelationBook,
    auctions: AHashMap<AuctionId, Auction>,
    next_auction: u32,
    faults: AHashSet<StoreOp>,
}

impl Tables {
    fn check(&self, op: StoreOp) -> Result<()> {
        if self.faults.contains(&op) {
            return Err(RealmError::Store(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn city_mut(&mut self, id: CityId) -> Result<&mut City> {
        self.cities.get_mut(&id).ok_or_else(|| RealmError::not_found("city", id.0))
    }

    fn nation_mut(&mut self, id: NationId) -> Result<&mut Nation> {
        self.nations.get_mut(&id).ok_or_else(|| RealmError::not_found("nation", id.0))
    }

    fn general_mut(&mut self, id: GeneralId) -> Result<&mut General> {
        self.generals.get_mut(&id).ok_or_else(|| RealmError::not_found("general", id.0))
    }

    /// Debit a general, refusing overdrafts
    fn debit(&mut self, id: GeneralId, resource: ResourceType, amount: u64) -> Result<()> {
        let general = self.general_mut(id)?;
        if general.treasury.get(resource) < amount {
            return Err(ValidationError::InsufficientFunds {
                general: id,
                resource: resource.name(),
                needed: amount,
            }
            .into());
        }
        general.treasury.apply(resource, -(amount as i64));
        Ok(())
    }
}

/// One shard held in process memory
#[derive(Debug)]
pub struct InMemoryStore {
    shard: ShardId,
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new(shard: ShardId) -> Self {
        Self::from_snapshot(shard, WorldSnapshot::default())
    }

    pub fn from_snapshot(shard: ShardId, snapshot: WorldSnapshot) -> Self {
        let next_auction = snapshot.auctions.iter().map(|a| a.id.0).max().unwrap_or(0);
        let tables = Tables {
            date: snapshot.date,
            cities: snapshot.cities.into_iter().map(|c| (c.id, c)).collect(),
            nations: snapshot.nations.into_iter().map(|n| (n.id, n)).collect(),
            generals: snapshot.generals.into_iter().map(|g| (g.id, g)).collect(),
            relations: snapshot.relations,
            auctions: snapshot.auctions.into_iter().map(|a| (a.id, a)).collect(),
            next_auction,
            faults: AHashSet::new(),
        };
        Self { shard, tables: RwLock::new(tables) }
    }

    /// Copy of every table, sorted by id
    pub async fn snapshot(&self) -> WorldSnapshot {
        let t = self.tables.read().await;
        let mut cities: Vec<City> = t.cities.values().cloned().collect();
        cities.sort_by_key(|c| c.id);
        let mut nations: Vec<Nation> = t.nations.values().cloned().collect();
        nations.sort_by_key(|n| n.id);
        let mut generals: Vec<General> = t.generals.values().cloned().collect();
        generals.sort_by_key(|g| g.id);
        let mut auctions: Vec<Auction> = t.auctions.values().cloned().collect();
        auctions.sort_by_key(|a| a.id);
        WorldSnapshot {
            date: t.date,
            cities,
            nations,
            generals,
            relations: t.relations.clone(),
            auctions,
        }
    }

    pub async fn set_date(&self, date: GameDate) {
        self.tables.write().await.date = date;
    }

    /// Mutate the relation book directly (treaty commands live outside this crate)
    pub async fn with_relations<R>(&self, f: impl FnOnce(&mut RelationBook) -> R) -> R {
        f(&mut self.tables.write().await.relations)
    }

    /// Drop a general outright, as when they leave the shard
    pub async fn remove_general(&self, id: GeneralId) -> Option<General> {
        self.tables.write().await.generals.remove(&id)
    }

    /// Make every call of `op` fail until cleared
    pub async fn fail_on(&self, op: StoreOp) {
        self.tables.write().await.faults.insert(op);
    }

    pub async fn clear_faults(&self) {
        self.tables.write().await.faults.clear();
    }
}

#[async_trait]
impl WorldStore for InMemoryStore {
    fn shard(&self) -> ShardId {
        self.shard
    }

    async fn date(&self) -> Result<GameDate> {
        Ok(self.tables.read().await.date)
    }

    async fn city(&self, id: CityId) -> Result<City> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadCity)?;
        t.cities.get(&id).cloned().ok_or_else(|| RealmError::not_found("city", id.0))
    }

    async fn nation(&self, id: NationId) -> Result<Nation> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadNation)?;
        t.nations.get(&id).cloned().ok_or_else(|| RealmError::not_found("nation", id.0))
    }

    async fn general(&self, id: GeneralId) -> Result<General> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadGeneral)?;
        t.generals.get(&id).cloned().ok_or_else(|| RealmError::not_found("general", id.0))
    }

    async fn nations(&self) -> Result<Vec<Nation>> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadNation)?;
        let mut nations: Vec<Nation> = t.nations.values().cloned().collect();
        nations.sort_by_key(|n| n.id);
        Ok(nations)
    }

    async fn cities_of_nation(&self, nation: NationId) -> Result<Vec<City>> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadCity)?;
        let mut cities: Vec<City> =
            t.cities.values().filter(|c| c.nation == nation).cloned().collect();
        cities.sort_by_key(|c| c.id);
        Ok(cities)
    }

    async fn generals_of_nation(&self, nation: NationId) -> Result<Vec<General>> {
        let t = self.tables.read().await;
        t.check(StoreOp::LoadGeneral)?;
        let mut generals: Vec<General> =
            t.generals.values().filter(|g| g.nation == nation).cloned().collect();
        generals.sort_by_key(|g| g.id);
        Ok(generals)
    }

    async fn save_city(&self, city: &City) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::SaveCity)?;
        *t.city_mut(city.id)? = city.clone();
        Ok(())
    }

    async fn add_city_deaths(&self, id: CityId, deaths: u64) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::AddCityDeaths)?;
        let city = t.city_mut(id)?;
        city.dead = city.dead.saturating_add(deaths);
        Ok(())
    }

    async fn set_city_supply(&self, id: CityId, supply: bool) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::SetCitySupply)?;
        t.city_mut(id)?.supply = supply;
        Ok(())
    }

    async fn adjust_nation(&self, id: NationId, delta: NationDelta) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::AdjustNation)?;
        t.nation_mut(id)?.apply(&delta);
        Ok(())
    }

    async fn set_nation_capital(&self, id: NationId, capital: Option<CityId>) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::SetCapital)?;
        t.nation_mut(id)?.capital = capital;
        Ok(())
    }

    async fn mark_nation_destroyed(&self, id: NationId) -> Result<bool> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::DestroyNation)?;
        let nation = t.nation_mut(id)?;
        if nation.destroyed {
            return Ok(false);
        }
        nation.destroyed = true;
        nation.capital = None;
        Ok(true)
    }

    async fn adjust_general(&self, id: GeneralId, delta: GeneralDelta) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::AdjustGeneral)?;
        t.general_mut(id)?.apply(&delta);
        Ok(())
    }

    async fn move_general(&self, id: GeneralId, city: CityId) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::MoveGeneral)?;
        t.general_mut(id)?.city = city;
        Ok(())
    }

    async fn release_general(&self, id: GeneralId, loss: GeneralDelta) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::ReleaseGeneral)?;
        let general = t.general_mut(id)?;
        general.apply(&loss);
        general.nation = NationId::NEUTRAL;
        Ok(())
    }

    async fn relations(&self) -> Result<RelationBook> {
        let t = self.tables.read().await;
        t.check(StoreOp::Relations)?;
        Ok(t.relations.clone())
    }

    async fn record_battle_deaths(&self, me: NationId, you: NationId, deaths: u64) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::Relations)?;
        t.relations.record_battle_deaths(me, you, deaths);
        Ok(())
    }

    async fn decay_turn(&self, key: u64) -> Result<(DecayReport, usize)> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::Relations)?;
        t.check(StoreOp::TickCooldowns)?;
        let decay = t.relations.decay_terms_once(key);
        if decay.skipped {
            return Ok((decay, 0));
        }
        let mut ready = 0;
        for nation in t.nations.values_mut() {
            if nation.tick_strategic_cooldown() {
                ready += 1;
            }
        }
        Ok((decay, ready))
    }

    async fn remove_nation_relations(&self, nation: NationId) -> Result<usize> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::Relations)?;
        Ok(t.relations.remove_nation(nation))
    }

    async fn next_auction_id(&self) -> Result<AuctionId> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::InsertAuction)?;
        t.next_auction += 1;
        Ok(AuctionId(t.next_auction))
    }

    async fn auction(&self, id: AuctionId) -> Result<Auction> {
        let t = self.tables.read().await;
        t.check(StoreOp::ListAuctions)?;
        t.auctions.get(&id).cloned().ok_or_else(|| RealmError::not_found("auction", id.0))
    }

    async fn open_auctions(&self) -> Result<Vec<Auction>> {
        let t = self.tables.read().await;
        t.check(StoreOp::ListAuctions)?;
        let mut open: Vec<Auction> = t.auctions.values().filter(|a| !a.finished).cloned().collect();
        open.sort_by_key(|a| (a.close_deadline, a.id));
        Ok(open)
    }

    async fn insert_auction(&self, auction: &Auction) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::InsertAuction)?;
        if t.auctions.contains_key(&auction.id) {
            return Err(RealmError::Store(format!("{} already exists", auction.id)));
        }
        if let Some(host) = auction.terms.host.general() {
            let (resource, amount) = auction.terms.escrow();
            t.debit(host, resource, amount)?;
        }
        t.next_auction = t.next_auction.max(auction.id.0);
        t.auctions.insert(auction.id, auction.clone());
        Ok(())
    }

    async fn commit_bid(&self, auction: &Auction, bid: &Bid) -> Result<()> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::CommitBid)?;
        let stored = t
            .auctions
            .get(&auction.id)
            .ok_or_else(|| RealmError::not_found("auction", auction.id.0))?;
        if stored.finished {
            return Err(ValidationError::AuctionFinished(auction.id).into());
        }
        if stored.version + 1 != auction.version {
            return Err(RealmError::Store(format!("{} changed concurrently", auction.id)));
        }
        t.debit(bid.bidder, bid.hold.resource, bid.hold.amount)?;
        t.auctions.insert(auction.id, auction.clone());
        Ok(())
    }

    async fn commit_settlement(&self, settlement: &Settlement) -> Result<bool> {
        let mut t = self.tables.write().await;
        t.check(StoreOp::CommitSettlement)?;
        let stored = t
            .auctions
            .get(&settlement.auction)
            .ok_or_else(|| RealmError::not_found("auction", settlement.auction.0))?;
        if stored.finished {
            return Ok(false);
        }
        if stored.version != settlement.version {
            return Err(RealmError::Store(format!("{} changed concurrently", settlement.auction)));
        }
        // every recipient must exist before anything is credited
        for credit in &settlement.credits {
            if !t.generals.contains_key(&credit.general) {
                return Err(RealmError::not_found("general", credit.general.0));
            }
        }

        for credit in &settlement.credits {
            t.general_mut(credit.general)?.treasury.apply(credit.resource, credit.amount as i64);
        }
        if let Some(auction) = t.auctions.get_mut(&settlement.auction) {
            auction.mark_finished(settlement);
        }
        Ok(true)
    }
}
