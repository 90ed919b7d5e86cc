//! Seed derivation from stable game identifiers
//!
//! A seed is SHA-256 over `salt || label || parts`, where every piece is
//! type-tagged and length-prefixed so that distinct identifier tuples can
//! never encode to the same byte string.

use sha2::{Digest, Sha256};

use crate::core::calendar::GameDate;
use crate::core::types::{CityId, GeneralId, NationId, ShardId};

/// Length of a derived seed in bytes
pub const SEED_LEN: usize = 32;

/// A 32-byte seed suitable for `ChaCha20Rng::from_seed`
pub type Seed = [u8; SEED_LEN];

const DEFAULT_SALT: &[u8] = b"arc-realm/world-events/v1";

/// One identifier in a seed tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedPart {
    U64(u64),
    I64(i64),
    Str(String),
}

impl From<u64> for SeedPart {
    fn from(v: u64) -> Self {
        SeedPart::U64(v)
    }
}

impl From<u32> for SeedPart {
    fn from(v: u32) -> Self {
        SeedPart::U64(v as u64)
    }
}

impl From<i64> for SeedPart {
    fn from(v: i64) -> Self {
        SeedPart::I64(v)
    }
}

impl From<&str> for SeedPart {
    fn from(v: &str) -> Self {
        SeedPart::Str(v.to_string())
    }
}

impl From<NationId> for SeedPart {
    fn from(v: NationId) -> Self {
        SeedPart::U64(v.0 as u64)
    }
}

impl From<CityId> for SeedPart {
    fn from(v: CityId) -> Self {
        SeedPart::U64(v.0 as u64)
    }
}

impl From<GeneralId> for SeedPart {
    fn from(v: GeneralId) -> Self {
        SeedPart::U64(v.0 as u64)
    }
}

impl From<ShardId> for SeedPart {
    fn from(v: ShardId) -> Self {
        SeedPart::U64(v.0 as u64)
    }
}

/// Derives seeds under a deployment-specific hidden salt
#[derive(Debug, Clone)]
pub struct SeedDeriver {
    salt: Vec<u8>,
}

impl Default for SeedDeriver {
    fn default() -> Self {
        Self { salt: DEFAULT_SALT.to_vec() }
    }
}

impl SeedDeriver {
    pub fn with_salt(salt: impl Into<Vec<u8>>) -> Self {
        Self { salt: salt.into() }
    }

    /// Hash `label` and the ordered identifiers into a seed
    pub fn derive(&self, label: &str, parts: &[SeedPart]) -> Seed {
        let mut hasher = Sha256::new();
        write_piece(&mut hasher, b's', &self.salt);
        write_piece(&mut hasher, b'l', label.as_bytes());
        for part in parts {
            match part {
                SeedPart::U64(v) => write_piece(&mut hasher, b'u', &v.to_le_bytes()),
                SeedPart::I64(v) => write_piece(&mut hasher, b'i', &v.to_le_bytes()),
                SeedPart::Str(s) => write_piece(&mut hasher, b't', s.as_bytes()),
            }
        }
        hasher.finalize().into()
    }

    /// Seed for a turn-scoped action: `label, year, month, parts...`
    pub fn derive_for_turn(&self, label: &str, date: GameDate, parts: &[SeedPart]) -> Seed {
        let mut all = Vec::with_capacity(parts.len() + 2);
        all.push(SeedPart::U64(date.year as u64));
        all.push(SeedPart::U64(date.month as u64));
        all.extend_from_slice(parts);
        self.derive(label, &all)
    }
}

fn write_piece(hasher: &mut Sha256, tag: u8, bytes: &[u8]) {
    hasher.update([tag]);
    hasher.update((bytes.len() as u32).to_le_bytes());
    hasher.update(bytes);
}

/// Derive a seed with the built-in salt
pub fn derive_seed(label: &str, parts: &[SeedPart]) -> Seed {
    SeedDeriver::default().derive(label, parts)
}
