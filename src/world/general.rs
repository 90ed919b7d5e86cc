//! Generals - the acting characters

use serde::{Deserialize, Serialize};

use crate::core::types::{apply_signed, CityId, GeneralId, NationId, Treasury};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    pub id: GeneralId,
    pub name: String,
    pub nation: NationId,
    pub city: CityId,
    pub experience: u64,
    pub dedication: u64,
    pub treasury: Treasury,
}

impl General {
    pub fn new(id: GeneralId, name: impl Into<String>, nation: NationId, city: CityId) -> Self {
        Self {
            id,
            name: name.into(),
            nation,
            city,
            experience: 0,
            dedication: 0,
            treasury: Treasury::new(1_000, 1_000),
        }
    }

    pub fn with_stats(mut self, experience: u64, dedication: u64) -> Self {
        self.experience = experience;
        self.dedication = dedication;
        self
    }

    pub fn with_treasury(mut self, gold: u64, rice: u64) -> Self {
        self.treasury = Treasury::new(gold, rice);
        self
    }

    pub fn is_affiliated(&self) -> bool {
        !self.nation.is_neutral()
    }

    pub fn apply(&mut self, delta: &GeneralDelta) {
        self.experience = apply_signed(self.experience, delta.experience);
        self.dedication = apply_signed(self.dedication, delta.dedication);
        self.treasury.gold = apply_signed(self.treasury.gold, delta.gold);
        self.treasury.rice = apply_signed(self.treasury.rice, delta.rice);
    }
}

/// Relative change to a general's numeric fields (floors at zero)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneralDelta {
    pub experience: i64,
    pub dedication: i64,
    pub gold: i64,
    pub rice: i64,
}

impl GeneralDelta {
    pub fn merit(experience: i64, dedication: i64) -> Self {
        Self { experience, dedication, ..Default::default() }
    }

    pub fn resources(gold: i64, rice: i64) -> Self {
        Self { gold, rice, ..Default::default() }
    }
}
