//! Auction lifecycle: open, bid, extend, close
//!
//! Hosts escrow at open time, bidders hold their stake at bid time, and
//! settlement moves every hold in a single store commit.

mod lifecycle;
mod market;
mod service;
mod terms;

pub use lifecycle::{Auction, Bid, Credit, Hold, Settlement};
pub use market::NeutralMarket;
pub use service::{
    finalize_auction, finalize_due_auctions, open_auction, place_bid, BidReceipt, DueSweep,
    FinalizeOutcome,
};
pub use terms::{AuctionHost, AuctionKind, AuctionTerms};
