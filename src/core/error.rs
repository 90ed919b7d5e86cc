use thiserror::Error;

use crate::core::types::{AuctionId, CityId, GeneralId};

#[derive(Error, Debug)]
pub enum RealmError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u32 },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Conquest of {city} could not be persisted: {source}")]
    ConquestPersistence {
        city: CityId,
        #[source]
        source: Box<RealmError>,
    },

    #[error("Lock service error: {0}")]
    Lock(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl RealmError {
    pub fn not_found(kind: &'static str, id: u32) -> Self {
        RealmError::NotFound { kind, id }
    }
}

/// Synchronous rejections; nothing has been applied when one is returned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("close window must be {min}..={max} turns, got {got}")]
    CloseWindow { min: u32, max: u32, got: u32 },

    #[error("amount must be within {min}..={max}, got {got}")]
    Amount { min: u64, max: u64, got: u64 },

    #[error("start bid {got} must be within 50%..200% of amount {amount}")]
    StartBid { amount: u64, got: u64 },

    #[error(
        "finish bid {got} must be within 110%..200% of amount {amount} \
         and at least 110% of start bid {start}"
    )]
    FinishBid { amount: u64, start: u64, got: u64 },

    #[error("offered and requested resources must differ")]
    SameResource,

    #[error("{general} cannot afford {needed} {resource}")]
    InsufficientFunds {
        general: GeneralId,
        resource: &'static str,
        needed: u64,
    },

    #[error("{0} is already finished")]
    AuctionFinished(AuctionId),

    #[error("{0} is past its close deadline")]
    AuctionClosed(AuctionId),

    #[error("host cannot bid on own auction")]
    HostBid,

    #[error("bid {got} does not beat current best {best}")]
    BidTooWeak { best: u64, got: u64 },

    #[error("bid {got} is outside the allowed range {min}..={max}")]
    BidOutOfRange { min: u64, max: u64, got: u64 },

    #[error("conquest requires {0}")]
    MissingConquestState(&'static str),
}

pub type Result<T> = std::result::Result<T, RealmError>;
