//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for nations
///
/// Id 0 is the unaffiliated pseudo-nation: cities and generals with no
/// owner point at it, and it never participates in diplomacy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NationId(pub u32);

impl NationId {
    pub const NEUTRAL: NationId = NationId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn is_neutral(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nation#{}", self.0)
    }
}

/// Unique identifier for cities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CityId(pub u32);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "city#{}", self.0)
    }
}

/// Unique identifier for generals (the acting characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeneralId(pub u32);

impl fmt::Display for GeneralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "general#{}", self.0)
    }
}

/// Unique identifier for auctions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuctionId(pub u32);

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auction#{}", self.0)
    }
}

/// An independently scheduled world partition (one game session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShardId(pub u32);

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard#{}", self.0)
    }
}

/// Tradeable treasury resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Gold,
    Rice,
}

impl ResourceType {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Gold => "gold",
            ResourceType::Rice => "rice",
        }
    }
}

/// A pair of treasury amounts, used for nations and generals alike
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treasury {
    pub gold: u64,
    pub rice: u64,
}

impl Treasury {
    pub fn new(gold: u64, rice: u64) -> Self {
        Self { gold, rice }
    }

    pub fn get(&self, resource: ResourceType) -> u64 {
        match resource {
            ResourceType::Gold => self.gold,
            ResourceType::Rice => self.rice,
        }
    }

    /// Apply a signed delta to one resource, flooring at zero
    pub fn apply(&mut self, resource: ResourceType, delta: i64) {
        let slot = match resource {
            ResourceType::Gold => &mut self.gold,
            ResourceType::Rice => &mut self.rice,
        };
        *slot = apply_signed(*slot, delta);
    }
}

/// Add a signed delta to an unsigned counter, saturating at both ends
pub fn apply_signed(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta as u64)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}
