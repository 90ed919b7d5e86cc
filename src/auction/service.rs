//! Store-backed auction operations

use tracing::{debug, info, warn};

use super::lifecycle::{Auction, Bid, Settlement};
use super::terms::AuctionTerms;
use crate::chronicle::ChronicleEvent;
use crate::context::RealmContext;
use crate::core::calendar::Timestamp;
use crate::core::error::Result;
use crate::core::types::{AuctionId, GeneralId};
use crate::store::WorldStore;

/// Result of an accepted bid
#[derive(Debug, Clone, PartialEq)]
pub struct BidReceipt {
    pub bid: Bid,
    pub close_deadline: Timestamp,
    /// Present when the bid was an instant buy and the auction closed
    pub settlement: Option<Settlement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    Settled(Settlement),
    NotDue,
    /// Finished earlier, possibly by an abandoned attempt
    AlreadyFinished,
}

/// Outcome of one sweep over the due auctions of a shard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DueSweep {
    pub settled: Vec<Settlement>,
    /// Auctions left open by a failed settlement; retried on the next sweep
    pub failed: Vec<(AuctionId, String)>,
}

/// Open an auction; the host's escrow leaves their treasury immediately
pub async fn open_auction(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    terms: AuctionTerms,
    now: Timestamp,
) -> Result<Auction> {
    terms.validate(&ctx.config.auction)?;
    let id = store.next_auction_id().await?;
    let auction = Auction::open(id, store.shard(), terms, now, &ctx.config.auction)?;
    store.insert_auction(&auction).await?;

    info!(shard = %store.shard(), auction = %id, amount = terms.amount, "auction opened");
    let date = store.date().await?;
    let event = ChronicleEvent::AuctionOpened { auction: id, amount: terms.amount };
    ctx.chronicle.record(store.shard(), date, event);
    Ok(auction)
}

/// Place a bid, holding the bidder's stake; an instant bid settles on the spot
pub async fn place_bid(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    id: AuctionId,
    bidder: GeneralId,
    amount: u64,
    now: Timestamp,
) -> Result<BidReceipt> {
    let mut auction = store.auction(id).await?;
    let bid = auction.check_bid(bidder, amount, now)?;
    let instant = auction.is_instant(&bid);

    auction.apply_bid(bid, &ctx.config.auction);
    auction.version += 1;
    store.commit_bid(&auction, &bid).await?;
    debug!(
        auction = %id,
        bidder = %bidder,
        amount,
        deadline = auction.close_deadline.millis(),
        "bid accepted"
    );

    let settlement = if instant {
        match finalize_auction(store, ctx, id, now).await? {
            FinalizeOutcome::Settled(s) => Some(s),
            _ => None,
        }
    } else {
        None
    };

    Ok(BidReceipt { bid, close_deadline: auction.close_deadline, settlement })
}

/// Settle an auction if it is due
///
/// Safe to retry: a second attempt on a finished auction does nothing.
pub async fn finalize_auction(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    id: AuctionId,
    now: Timestamp,
) -> Result<FinalizeOutcome> {
    let auction = store.auction(id).await?;
    if auction.finished {
        return Ok(FinalizeOutcome::AlreadyFinished);
    }
    let Some(settlement) = auction.try_finish(now) else {
        return Ok(FinalizeOutcome::NotDue);
    };

    if !store.commit_settlement(&settlement).await? {
        return Ok(FinalizeOutcome::AlreadyFinished);
    }

    let date = store.date().await?;
    let event = match settlement.winner {
        Some(win) => {
            info!(
                shard = %store.shard(),
                auction = %id,
                winner = %win.bidder,
                price = win.amount,
                "auction settled"
            );
            ChronicleEvent::AuctionSettled { auction: id, winner: win.bidder, price: win.amount }
        }
        None => {
            info!(shard = %store.shard(), auction = %id, "auction expired without bids");
            ChronicleEvent::AuctionExpired { auction: id }
        }
    };
    ctx.chronicle.record(store.shard(), date, event);
    Ok(FinalizeOutcome::Settled(settlement))
}

/// Finalize every due auction, earliest deadline first
///
/// One auction failing to settle does not hold back the others; only a
/// failure to list the shard's auctions is returned as an error.
pub async fn finalize_due_auctions(
    store: &dyn WorldStore,
    ctx: &RealmContext,
    now: Timestamp,
) -> Result<DueSweep> {
    let mut sweep = DueSweep::default();
    // open_auctions is sorted by (close_deadline, id)
    for auction in store.open_auctions().await? {
        if !auction.is_due(now) {
            continue;
        }
        match finalize_auction(store, ctx, auction.id, now).await {
            Ok(FinalizeOutcome::Settled(s)) => sweep.settled.push(s),
            Ok(_) => {}
            Err(e) => {
                warn!(
                    shard = %store.shard(),
                    auction = %auction.id,
                    error = %e,
                    "auction settlement failed"
                );
                sweep.failed.push((auction.id, e.to_string()));
            }
        }
    }
    Ok(sweep)
}
