//! Auction parameters and their validation

use serde::{Deserialize, Serialize};

use crate::core::config::AuctionConfig;
use crate::core::error::ValidationError;
use crate::core::types::{GeneralId, ResourceType};

/// Forward or reverse auction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionKind {
    /// Host sells `amount` of `offered`; highest bid (in `requested`) wins
    Sell,
    /// Host buys `amount` of `requested`, paying in `offered`; lowest asking price wins
    Buy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuctionHost {
    /// The market itself; never debited or credited
    Neutral,
    General(GeneralId),
}

impl AuctionHost {
    pub fn general(&self) -> Option<GeneralId> {
        match self {
            AuctionHost::Neutral => None,
            AuctionHost::General(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionTerms {
    pub kind: AuctionKind,
    pub host: AuctionHost,
    pub offered: ResourceType,
    pub requested: ResourceType,
    pub amount: u64,
    pub start_bid: u64,
    /// Instant-buy price (Sell) or price ceiling (Buy)
    pub finish_bid: u64,
    pub close_turns: u32,
}

impl AuctionTerms {
    pub fn sell(
        host: AuctionHost,
        offered: ResourceType,
        requested: ResourceType,
        amount: u64,
    ) -> Self {
        Self {
            kind: AuctionKind::Sell,
            host,
            offered,
            requested,
            amount,
            start_bid: amount,
            finish_bid: amount * 2,
            close_turns: 12,
        }
    }

    pub fn buy(
        host: AuctionHost,
        offered: ResourceType,
        requested: ResourceType,
        amount: u64,
    ) -> Self {
        Self { kind: AuctionKind::Buy, ..Self::sell(host, offered, requested, amount) }
    }

    pub fn with_bids(mut self, start_bid: u64, finish_bid: u64) -> Self {
        self.start_bid = start_bid;
        self.finish_bid = finish_bid;
        self
    }

    pub fn with_close_turns(mut self, close_turns: u32) -> Self {
        self.close_turns = close_turns;
        self
    }

    /// What the host puts into escrow at open time
    pub fn escrow(&self) -> (ResourceType, u64) {
        match self.kind {
            AuctionKind::Sell => (self.offered, self.amount),
            AuctionKind::Buy => (self.offered, self.finish_bid),
        }
    }

    /// Check the opening rules; nothing is applied on failure
    pub fn validate(&self, config: &AuctionConfig) -> Result<(), ValidationError> {
        if self.offered == self.requested {
            return Err(ValidationError::SameResource);
        }
        if self.close_turns < config.min_close_turns || self.close_turns > config.max_close_turns {
            return Err(ValidationError::CloseWindow {
                min: config.min_close_turns,
                max: config.max_close_turns,
                got: self.close_turns,
            });
        }
        if self.amount < config.min_amount || self.amount > config.max_amount {
            return Err(ValidationError::Amount {
                min: config.min_amount,
                max: config.max_amount,
                got: self.amount,
            });
        }

        // start bid within 50%..=200% of amount
        if self.start_bid * 2 < self.amount || self.start_bid > self.amount * 2 {
            return Err(ValidationError::StartBid { amount: self.amount, got: self.start_bid });
        }

        // finish bid within 110%..=200% of amount and >= 110% of start bid
        let finish_ok = self.finish_bid * 100 >= self.amount * 110
            && self.finish_bid <= self.amount * 2
            && self.finish_bid * 100 >= self.start_bid * 110;
        if !finish_ok {
            return Err(ValidationError::FinishBid {
                amount: self.amount,
                start: self.start_bid,
                got: self.finish_bid,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms() -> AuctionTerms {
        let host = AuctionHost::General(GeneralId(1));
        AuctionTerms::sell(host, ResourceType::Rice, ResourceType::Gold, 1_000)
            .with_bids(600, 1_300)
            .with_close_turns(6)
    }

    #[test]
    fn test_valid_terms() {
        assert_eq!(terms().validate(&AuctionConfig::default()), Ok(()));
    }

    #[test]
    fn test_close_window() {
        let cfg = AuctionConfig::default();
        assert!(matches!(
            terms().with_close_turns(0).validate(&cfg),
            Err(ValidationError::CloseWindow { got: 0, .. })
        ));
        assert!(terms().with_close_turns(25).validate(&cfg).is_err());
        assert!(terms().with_close_turns(24).validate(&cfg).is_ok());
        assert!(terms().with_close_turns(1).validate(&cfg).is_ok());
    }

    #[test]
    fn test_amount_bounds() {
        let cfg = AuctionConfig::default();
        let mut t = terms();
        t.amount = 50;
        assert!(matches!(t.validate(&cfg), Err(ValidationError::Amount { .. })));
    }

    #[test]
    fn test_start_bid_bounds() {
        let cfg = AuctionConfig::default();
        assert!(terms().with_bids(500, 1_100).validate(&cfg).is_ok());
        assert!(matches!(
            terms().with_bids(499, 1_300).validate(&cfg),
            Err(ValidationError::StartBid { .. })
        ));
        assert!(terms().with_bids(2_001, 2_000).validate(&cfg).is_err());
    }

    #[test]
    fn test_finish_bid_bounds() {
        let cfg = AuctionConfig::default();
        // below 110% of amount
        assert!(terms().with_bids(600, 1_099).validate(&cfg).is_err());
        // above 200% of amount
        assert!(terms().with_bids(600, 2_001).validate(&cfg).is_err());
        // below 110% of start bid
        assert!(matches!(
            terms().with_bids(1_500, 1_600).validate(&cfg),
            Err(ValidationError::FinishBid { .. })
        ));
        assert!(terms().with_bids(1_500, 1_650).validate(&cfg).is_ok());
    }

    #[test]
    fn test_same_resource_rejected() {
        let mut t = terms();
        t.requested = ResourceType::Rice;
        assert_eq!(t.validate(&AuctionConfig::default()), Err(ValidationError::SameResource));
    }

    #[test]
    fn test_escrow_by_kind() {
        assert_eq!(terms().escrow(), (ResourceType::Rice, 1_000));
        let mut t = terms();
        t.kind = AuctionKind::Buy;
        assert_eq!(t.escrow(), (ResourceType::Rice, 1_300));
    }
}
