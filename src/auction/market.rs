//! Neutral market registrar
//!
//! Keeps a floor of market-hosted rice auctions open in every shard so
//! generals always have somewhere to buy food.

use tracing::info;

use super::lifecycle::Auction;
use super::service::open_auction;
use super::terms::{AuctionHost, AuctionKind, AuctionTerms};
use crate::context::RealmContext;
use crate::core::calendar::Timestamp;
use crate::core::error::Result;
use crate::core::types::{AuctionId, ResourceType};
use crate::random::{DeterministicStream, RealmRng, SeedPart};
use crate::store::WorldStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralMarket;

impl NeutralMarket {
    fn is_neutral_listing(auction: &Auction) -> bool {
        auction.terms.host == AuctionHost::Neutral
            && auction.terms.kind == AuctionKind::Sell
            && auction.terms.offered == ResourceType::Rice
    }

    /// Draw the terms of one listing
    pub fn listing_terms(ctx: &RealmContext, rng: &mut dyn RealmRng) -> AuctionTerms {
        let market = &ctx.config.market;
        let lo = market.neutral_min_amount.div_ceil(100) as i64;
        let hi = (market.neutral_max_amount / 100) as i64;
        let ceiling = market.neutral_max_amount.max(market.neutral_min_amount);
        let amount = (rng.next_range_int(lo, hi.max(lo)) as u64 * 100)
            .clamp(market.neutral_min_amount, ceiling);

        // open at 80-100% of the amount, instant-buy at 150-200%
        let start_bid = amount * rng.next_range_int(80, 100) as u64 / 100;
        let finish_bid = amount * rng.next_range_int(150, 200) as u64 / 100;

        AuctionTerms::sell(AuctionHost::Neutral, ResourceType::Rice, ResourceType::Gold, amount)
            .with_bids(start_bid, finish_bid)
            .with_close_turns(market.neutral_close_turns)
    }

    /// Open listings until the shard has `neutral_auction_target` of them
    pub async fn replenish(
        &self,
        store: &dyn WorldStore,
        ctx: &RealmContext,
        cycle: u64,
        now: Timestamp,
    ) -> Result<Vec<AuctionId>> {
        let target = ctx.config.market.neutral_auction_target;
        let open = store
            .open_auctions()
            .await?
            .iter()
            .filter(|a| Self::is_neutral_listing(a))
            .count();

        let mut opened = Vec::new();
        for index in open..target {
            let seed = ctx.seeds.derive(
                "NeutralAuction",
                &[SeedPart::from(store.shard()), SeedPart::U64(cycle), SeedPart::U64(index as u64)],
            );
            let mut rng = DeterministicStream::new(seed);
            let terms = Self::listing_terms(ctx, &mut rng);
            let auction = open_auction(store, ctx, terms, now).await?;
            opened.push(auction.id);
        }

        if !opened.is_empty() {
            info!(shard = %store.shard(), count = opened.len(), "neutral market listings opened");
        }
        Ok(opened)
    }
}
