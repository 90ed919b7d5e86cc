//! Engine configuration with documented constants
//!
//! All tunables the core consumes are collected here. The surrounding system
//! loads them once (usually from TOML) and passes the struct into every
//! entry point; nothing in this crate reads configuration from globals.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{RealmError, Result};

/// Top-level configuration for the world-event engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmConfig {
    pub auction: AuctionConfig,
    pub battle: BattleConfig,
    pub diplomacy: DiplomacyConfig,
    pub scheduler: SchedulerConfig,
    pub market: MarketConfig,
}

/// Auction opening bounds and anti-sniping extension rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Smallest tradeable amount per auction
    pub min_amount: u64,
    /// Largest tradeable amount per auction
    pub max_amount: u64,
    /// Shortest close window, in turns
    pub min_close_turns: u32,
    /// Longest close window, in turns
    pub max_close_turns: u32,
    /// Wall-clock length of one turn, in minutes
    ///
    /// The close deadline is `open time + close_turns * turn_minutes`.
    pub turn_minutes: u64,
    /// Bid amount that buys one extra minute of extension
    ///
    /// A bid of 3500 with a unit of 1000 asks for 3 minutes; every bid asks
    /// for at least one minute.
    pub extension_per_bid_unit: u64,
    /// Most minutes a single bid may add
    pub max_extension_per_bid_minutes: u64,
    /// Ceiling on how far past the original deadline bids may push
    pub max_total_extension_minutes: u64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            min_amount: 100,
            max_amount: 10_000,
            min_close_turns: 1,
            max_close_turns: 24,
            turn_minutes: 60,
            extension_per_bid_unit: 1_000,
            max_extension_per_bid_minutes: 5,
            max_total_extension_minutes: 60,
        }
    }
}

/// Post-battle and conquest tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Floor for the general-count divisor in the tech gain formulas
    ///
    /// Keeps a tiny nation from gaining a full share of tech per casualty.
    pub min_general_divisor: u32,
    /// Attacker tech gained per enemy death (before the divisor)
    pub attacker_tech_rate: f64,
    /// Defender tech gained per enemy death (before the divisor)
    pub defender_tech_rate: f64,
    /// Highest city level still considered "small" for the post-conquest reset
    pub small_city_level_max: u8,
    /// Defense baseline for large cities after conquest
    pub large_city_defense: u64,
    /// Wall baseline for large cities after conquest
    pub large_city_wall: u64,
    /// Farthest ring searched when relocating a lost capital
    pub capital_search_depth: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            min_general_divisor: 10,
            attacker_tech_rate: 0.012,
            defender_tech_rate: 0.009,
            small_city_level_max: 3,
            large_city_defense: 1_000,
            large_city_wall: 1_000,
            capital_search_depth: 99,
        }
    }
}

/// Default terms for bilateral treaties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    /// Turns between a declaration and automatic war
    pub declaration_term: u32,
    pub alliance_term: u32,
    pub no_aggression_term: u32,
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            declaration_term: 5,
            alliance_term: 12,
            no_aggression_term: 12,
        }
    }
}

/// Periodic driver timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Time between cycles
    pub interval_ms: u64,
    /// TTL of the per-shard lock; must be strictly shorter than the interval
    pub lock_ttl_ms: u64,
    /// TTL of the outer lock guarding shard enumeration
    pub enumeration_lock_ttl_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 60_000,
            lock_ttl_ms: 30_000,
            enumeration_lock_ttl_ms: 10_000,
        }
    }
}

/// Neutral market registrar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Open neutral auctions to keep per shard (0 disables the registrar)
    pub neutral_auction_target: usize,
    pub neutral_min_amount: u64,
    pub neutral_max_amount: u64,
    pub neutral_close_turns: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            neutral_auction_target: 1,
            neutral_min_amount: 1_000,
            neutral_max_amount: 5_000,
            neutral_close_turns: 6,
        }
    }
}

impl RealmConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RealmConfig = toml::from_str(content)?;
        config.validate().map_err(RealmError::InvalidConfig)?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        let a = &self.auction;
        if a.min_amount == 0 || a.min_amount > a.max_amount {
            return Err(format!(
                "auction.min_amount ({}) must be positive and <= max_amount ({})",
                a.min_amount, a.max_amount
            ));
        }
        if a.min_close_turns < 1
            || a.max_close_turns > 24
            || a.min_close_turns > a.max_close_turns
        {
            return Err(format!(
                "auction close window {}..={} must lie inside 1..=24",
                a.min_close_turns, a.max_close_turns
            ));
        }
        if a.extension_per_bid_unit == 0 || a.turn_minutes == 0 {
            return Err("auction.extension_per_bid_unit and turn_minutes must be positive".into());
        }
        if a.max_extension_per_bid_minutes == 0 {
            return Err("auction.max_extension_per_bid_minutes must be at least 1".into());
        }

        if self.battle.min_general_divisor == 0 {
            return Err("battle.min_general_divisor must be positive".into());
        }

        let s = &self.scheduler;
        if s.interval_ms == 0 {
            return Err("scheduler.interval_ms must be positive".into());
        }
        if s.lock_ttl_ms == 0 || s.lock_ttl_ms >= s.interval_ms {
            return Err(format!(
                "scheduler.lock_ttl_ms ({}) must be positive and shorter than interval_ms ({})",
                s.lock_ttl_ms, s.interval_ms
            ));
        }
        if s.enumeration_lock_ttl_ms == 0 || s.enumeration_lock_ttl_ms >= s.interval_ms {
            return Err(
                "scheduler.enumeration_lock_ttl_ms must be positive and shorter than interval_ms"
                    .into(),
            );
        }

        let m = &self.market;
        if m.neutral_auction_target > 0 {
            if m.neutral_min_amount > m.neutral_max_amount
                || m.neutral_min_amount < a.min_amount
                || m.neutral_max_amount > a.max_amount
            {
                return Err(
                    "market neutral amounts must lie within the auction amount bounds".into()
                );
            }
            // listings are drawn in whole hundreds
            if m.neutral_min_amount.div_ceil(100) * 100 > m.neutral_max_amount {
                return Err(format!(
                    "market neutral amounts {}..={} must include a multiple of 100",
                    m.neutral_min_amount, m.neutral_max_amount
                ));
            }
            if m.neutral_close_turns < a.min_close_turns
                || m.neutral_close_turns > a.max_close_turns
            {
                return Err(
                    "market.neutral_close_turns must lie within the auction close window".into()
                );
            }
        }

        Ok(())
    }
}
