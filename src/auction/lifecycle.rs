//! Bid / extend / close state machine for one auction
//!
//! Everything here is pure: the store commits the resulting holds and
//! settlements atomically.

use serde::{Deserialize, Serialize};

use super::terms::{AuctionHost, AuctionKind, AuctionTerms};
use crate::core::calendar::Timestamp;
use crate::core::config::AuctionConfig;
use crate::core::error::ValidationError;
use crate::core::types::{AuctionId, GeneralId, ResourceType, ShardId};

/// Resource moved out of a general's treasury while a bid is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub resource: ResourceType,
    pub amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bidder: GeneralId,
    pub amount: u64,
    pub placed_at: Timestamp,
    pub hold: Hold,
}

/// One credit to a general's treasury during settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    pub general: GeneralId,
    pub resource: ResourceType,
    pub amount: u64,
}

/// Full outcome of closing an auction; applied all-or-nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub auction: AuctionId,
    /// Version the settlement was computed against
    pub version: u64,
    pub winner: Option<Bid>,
    pub credits: Vec<Credit>,
}

impl Settlement {
    pub fn credited(&self, general: GeneralId, resource: ResourceType) -> u64 {
        self.credits
            .iter()
            .filter(|c| c.general == general && c.resource == resource)
            .map(|c| c.amount)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub shard: ShardId,
    pub terms: AuctionTerms,
    pub opened_at: Timestamp,
    pub original_deadline: Timestamp,
    pub close_deadline: Timestamp,
    /// Ordered by placement time
    pub bids: Vec<Bid>,
    pub finished: bool,
    pub winner: Option<GeneralId>,
    /// Bumped on every committed change
    pub version: u64,
}

impl Auction {
    /// Validate the terms and compute the initial deadline
    pub fn open(
        id: AuctionId,
        shard: ShardId,
        terms: AuctionTerms,
        now: Timestamp,
        config: &AuctionConfig,
    ) -> Result<Self, ValidationError> {
        terms.validate(config)?;
        let deadline = now.plus_minutes(terms.close_turns as u64 * config.turn_minutes);
        Ok(Self {
            id,
            shard,
            terms,
            opened_at: now,
            original_deadline: deadline,
            close_deadline: deadline,
            bids: Vec::new(),
            finished: false,
            winner: None,
            version: 0,
        })
    }

    /// Best bid so far: highest for Sell, lowest for Buy, earliest on equal amounts
    pub fn best_bid(&self) -> Option<&Bid> {
        let mut best: Option<&Bid> = None;
        for bid in &self.bids {
            let better = match (best, self.terms.kind) {
                (None, _) => true,
                (Some(b), AuctionKind::Sell) => bid.amount > b.amount,
                (Some(b), AuctionKind::Buy) => bid.amount < b.amount,
            };
            if better {
                best = Some(bid);
            }
        }
        best
    }

    /// Past the deadline, or holding an instant bid whose settlement never committed
    pub fn is_due(&self, now: Timestamp) -> bool {
        if self.finished {
            return false;
        }
        now >= self.close_deadline || self.best_bid().is_some_and(|b| self.is_instant(b))
    }

    /// What a bid of `amount` would lock away from the bidder
    pub fn hold_for(&self, amount: u64) -> Hold {
        match self.terms.kind {
            AuctionKind::Sell => Hold { resource: self.terms.requested, amount },
            AuctionKind::Buy => Hold { resource: self.terms.requested, amount: self.terms.amount },
        }
    }

    /// Check a bid without applying it
    pub fn check_bid(
        &self,
        bidder: GeneralId,
        amount: u64,
        now: Timestamp,
    ) -> Result<Bid, ValidationError> {
        if self.finished {
            return Err(ValidationError::AuctionFinished(self.id));
        }
        if now >= self.close_deadline {
            return Err(ValidationError::AuctionClosed(self.id));
        }
        if self.terms.host == AuctionHost::General(bidder) {
            return Err(ValidationError::HostBid);
        }

        let (min, max) = (self.terms.start_bid, self.terms.finish_bid);
        match self.terms.kind {
            AuctionKind::Sell => {
                if amount < min || amount > max {
                    return Err(ValidationError::BidOutOfRange { min, max, got: amount });
                }
                if let Some(best) = self.best_bid() {
                    if amount <= best.amount {
                        return Err(ValidationError::BidTooWeak { best: best.amount, got: amount });
                    }
                }
            }
            AuctionKind::Buy => {
                // asking prices run from the ceiling down to the start bid
                let floor = min.min(max);
                if amount < floor || amount > max {
                    return Err(ValidationError::BidOutOfRange { min: floor, max, got: amount });
                }
                if let Some(best) = self.best_bid() {
                    if amount >= best.amount {
                        return Err(ValidationError::BidTooWeak { best: best.amount, got: amount });
                    }
                }
            }
        }

        Ok(Bid { bidder, amount, placed_at: now, hold: self.hold_for(amount) })
    }

    /// Whether `bid` ends the auction on the spot
    pub fn is_instant(&self, bid: &Bid) -> bool {
        match self.terms.kind {
            AuctionKind::Sell => bid.amount >= self.terms.finish_bid,
            AuctionKind::Buy => bid.amount <= self.terms.start_bid,
        }
    }

    /// Record an accepted bid and push the deadline out
    pub fn apply_bid(&mut self, bid: Bid, config: &AuctionConfig) {
        self.extend_deadline(bid.amount, bid.placed_at, config);
        self.bids.push(bid);
    }

    fn extend_deadline(&mut self, amount: u64, now: Timestamp, config: &AuctionConfig) {
        let per_bid = (amount / config.extension_per_bid_unit.max(1))
            .max(1)
            .min(config.max_extension_per_bid_minutes.max(1));
        let ceiling = self.original_deadline.plus_minutes(config.max_total_extension_minutes);
        let target = now.plus_minutes(per_bid).min(ceiling);
        if target > self.close_deadline {
            self.close_deadline = target;
        }
    }

    /// Close the auction if it is due
    pub fn try_finish(&self, now: Timestamp) -> Option<Settlement> {
        if !self.is_due(now) {
            return None;
        }
        Some(self.settle())
    }

    /// Compute the settlement against the current bids
    pub fn settle(&self) -> Settlement {
        let terms = &self.terms;
        let host = terms.host.general();
        let winner = self.best_bid().copied();
        let mut credits = Vec::new();

        let mut credit = |general: Option<GeneralId>, resource: ResourceType, amount: u64| {
            if let Some(general) = general {
                if amount > 0 {
                    credits.push(Credit { general, resource, amount });
                }
            }
        };

        match (winner, terms.kind) {
            (None, _) => {
                let (resource, amount) = terms.escrow();
                credit(host, resource, amount);
            }
            (Some(win), AuctionKind::Sell) => {
                credit(Some(win.bidder), terms.offered, terms.amount);
                credit(host, terms.requested, win.amount);
            }
            (Some(win), AuctionKind::Buy) => {
                credit(Some(win.bidder), terms.offered, win.amount);
                credit(host, terms.requested, terms.amount);
                credit(host, terms.offered, terms.finish_bid.saturating_sub(win.amount));
            }
        }

        // everyone else gets their hold back
        for bid in &self.bids {
            if winner.as_ref() == Some(bid) {
                continue;
            }
            credit(Some(bid.bidder), bid.hold.resource, bid.hold.amount);
        }

        Settlement { auction: self.id, version: self.version, winner, credits }
    }

    /// Mark finished; a finished auction is never touched again
    pub fn mark_finished(&mut self, settlement: &Settlement) {
        self.finished = true;
        self.winner = settlement.winner.map(|b| b.bidder);
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: GeneralId = GeneralId(1);
    const ALICE: GeneralId = GeneralId(2);
    const BOB: GeneralId = GeneralId(3);

    fn t0() -> Timestamp {
        Timestamp::from_millis(1_000_000)
    }

    fn sell() -> Auction {
        let host = AuctionHost::General(HOST);
        let terms = AuctionTerms::sell(host, ResourceType::Rice, ResourceType::Gold, 1_000)
            .with_bids(600, 1_300)
            .with_close_turns(1);
        Auction::open(AuctionId(1), ShardId(1), terms, t0(), &AuctionConfig::default()).unwrap()
    }

    fn buy() -> Auction {
        let host = AuctionHost::General(HOST);
        let terms = AuctionTerms::buy(host, ResourceType::Gold, ResourceType::Rice, 1_000)
            .with_bids(600, 1_300)
            .with_close_turns(1);
        Auction::open(AuctionId(2), ShardId(1), terms, t0(), &AuctionConfig::default()).unwrap()
    }

    #[test]
    fn test_open_sets_deadline_from_turns() {
        let a = sell();
        assert_eq!(a.close_deadline, t0().plus_minutes(60));
        assert_eq!(a.original_deadline, a.close_deadline);
        assert!(!a.finished);
    }

    #[test]
    fn test_sell_bids_must_increase() {
        let cfg = AuctionConfig::default();
        let mut a = sell();
        let bid = a.check_bid(ALICE, 700, t0()).unwrap();
        a.apply_bid(bid, &cfg);

        assert_eq!(
            a.check_bid(BOB, 700, t0()),
            Err(ValidationError::BidTooWeak { best: 700, got: 700 })
        );
        assert!(matches!(a.check_bid(BOB, 500, t0()), Err(ValidationError::BidOutOfRange { .. })));
        assert!(matches!(
            a.check_bid(BOB, 1_301, t0()),
            Err(ValidationError::BidOutOfRange { .. })
        ));
        assert_eq!(a.check_bid(HOST, 900, t0()), Err(ValidationError::HostBid));
        assert!(a.check_bid(BOB, 701, t0()).is_ok());
    }

    #[test]
    fn test_buy_bids_must_decrease() {
        let cfg = AuctionConfig::default();
        let mut a = buy();
        let bid = a.check_bid(ALICE, 1_200, t0()).unwrap();
        assert_eq!(bid.hold, Hold { resource: ResourceType::Rice, amount: 1_000 });
        a.apply_bid(bid, &cfg);

        assert!(matches!(a.check_bid(BOB, 1_250, t0()), Err(ValidationError::BidTooWeak { .. })));
        let bid = a.check_bid(BOB, 600, t0()).unwrap();
        assert!(a.is_instant(&bid));
    }

    #[test]
    fn test_late_bid_extends_deadline() {
        let cfg = AuctionConfig::default();
        let mut a = sell();
        let now = Timestamp::from_millis(a.close_deadline.millis() - 30_000);
        let bid = a.check_bid(ALICE, 700, now).unwrap();
        a.apply_bid(bid, &cfg);
        // 700 / 1000 rounds to 0, so the minimum one-minute extension applies
        assert_eq!(a.close_deadline, now.plus_minutes(1));
    }

    #[test]
    fn test_early_bid_does_not_extend() {
        let cfg = AuctionConfig::default();
        let mut a = sell();
        let before = a.close_deadline;
        let bid = a.check_bid(ALICE, 700, t0()).unwrap();
        a.apply_bid(bid, &cfg);
        assert_eq!(a.close_deadline, before);
    }

    #[test]
    fn test_extension_is_capped() {
        let cfg = AuctionConfig::default();
        let mut a = sell();
        // repeated sniping just before the deadline can never pass the ceiling
        let ceiling = a.original_deadline.plus_minutes(cfg.max_total_extension_minutes);
        let mut amount = 700;
        while amount <= 1_290 {
            let now = Timestamp::from_millis(a.close_deadline.millis() - 1);
            let bid = a.check_bid(ALICE, amount, now).unwrap();
            a.apply_bid(bid, &cfg);
            assert!(a.close_deadline <= ceiling);
            amount += 5;
        }
        assert_eq!(a.close_deadline, ceiling);
    }

    #[test]
    fn test_closed_auction_rejects_bids() {
        let a = sell();
        assert_eq!(
            a.check_bid(ALICE, 700, a.close_deadline),
            Err(ValidationError::AuctionClosed(a.id))
        );
    }

    #[test]
    fn test_sell_settlement_refunds_losers() {
        let cfg = AuctionConfig::default();
        let mut a = sell();
        for (bidder, amount) in [(ALICE, 700), (BOB, 900)] {
            let bid = a.check_bid(bidder, amount, t0()).unwrap();
            a.apply_bid(bid, &cfg);
        }
        assert!(a.try_finish(t0()).is_none());

        let s = a.try_finish(a.close_deadline).unwrap();
        assert_eq!(s.winner.map(|b| b.bidder), Some(BOB));
        assert_eq!(s.credited(BOB, ResourceType::Rice), 1_000);
        assert_eq!(s.credited(HOST, ResourceType::Gold), 900);
        assert_eq!(s.credited(ALICE, ResourceType::Gold), 700);
        assert_eq!(s.credited(BOB, ResourceType::Gold), 0);
    }

    #[test]
    fn test_buy_settlement_refunds_host_difference() {
        let cfg = AuctionConfig::default();
        let mut a = buy();
        for (bidder, amount) in [(ALICE, 1_200), (BOB, 1_000)] {
            let bid = a.check_bid(bidder, amount, t0()).unwrap();
            a.apply_bid(bid, &cfg);
        }
        let s = a.settle();
        assert_eq!(s.credited(BOB, ResourceType::Gold), 1_000);
        assert_eq!(s.credited(HOST, ResourceType::Rice), 1_000);
        assert_eq!(s.credited(HOST, ResourceType::Gold), 300);
        assert_eq!(s.credited(ALICE, ResourceType::Rice), 1_000);
    }

    #[test]
    fn test_no_bids_returns_escrow() {
        let a = sell();
        let s = a.settle();
        assert!(s.winner.is_none());
        let refund = Credit { general: HOST, resource: ResourceType::Rice, amount: 1_000 };
        assert_eq!(s.credits, vec![refund]);
    }

    #[test]
    fn test_neutral_host_gets_nothing() {
        let terms =
            AuctionTerms::sell(AuctionHost::Neutral, ResourceType::Rice, ResourceType::Gold, 1_000);
        let config = AuctionConfig::default();
        let mut a = Auction::open(AuctionId(9), ShardId(1), terms, t0(), &config).unwrap();
        assert!(a.settle().credits.is_empty());

        let bid = a.check_bid(ALICE, 1_500, t0()).unwrap();
        a.apply_bid(bid, &AuctionConfig::default());
        let s = a.settle();
        assert_eq!(s.credits.len(), 1);
        assert_eq!(s.credited(ALICE, ResourceType::Rice), 1_000);
    }

    #[test]
    fn test_finished_is_terminal() {
        let mut a = sell();
        let s = a.settle();
        a.mark_finished(&s);
        assert!(a.try_finish(a.close_deadline).is_none());
        assert_eq!(a.check_bid(ALICE, 700, t0()), Err(ValidationError::AuctionFinished(a.id)));
    }
}
