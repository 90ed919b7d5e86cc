//! Nations and relative treasury updates

use serde::{Deserialize, Serialize};

use crate::core::types::{apply_signed, CityId, NationId, Treasury};
use crate::observer::{GameEventObserver, StrategicCommand};

/// A nation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nation {
    pub id: NationId,
    pub name: String,
    pub color: String,
    pub capital: Option<CityId>,
    pub treasury: Treasury,
    pub tech: f64,
    /// Member general count
    pub general_count: u32,
    /// Turns until the next strategic command may be issued
    pub strategic_cooldown: u32,
    /// Set once the destruction cascade has run
    pub destroyed: bool,
}

impl Nation {
    pub fn new(id: NationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: "#808080".into(),
            capital: None,
            treasury: Treasury::new(10_000, 10_000),
            tech: 0.0,
            general_count: 0,
            strategic_cooldown: 0,
            destroyed: false,
        }
    }

    pub fn with_capital(mut self, capital: CityId) -> Self {
        self.capital = Some(capital);
        self
    }

    pub fn with_treasury(mut self, gold: u64, rice: u64) -> Self {
        self.treasury = Treasury::new(gold, rice);
        self
    }

    /// Apply a relative change
    pub fn apply(&mut self, delta: &NationDelta) {
        self.treasury.gold = apply_signed(self.treasury.gold, delta.gold);
        self.treasury.rice = apply_signed(self.treasury.rice, delta.rice);
        self.tech = (self.tech + delta.tech).max(0.0);
        self.general_count = apply_signed(self.general_count as u64, delta.general_count) as u32;
    }

    /// Start the cooldown after a strategic command
    ///
    /// A nation-level observer may lengthen or shorten the base delay.
    pub fn begin_strategic_cooldown(
        &mut self,
        command: StrategicCommand,
        base_delay: u32,
        observer: Option<&dyn GameEventObserver>,
    ) -> u32 {
        let delay = match observer {
            Some(o) => o.on_calc_strategic(command, base_delay),
            None => base_delay,
        };
        self.strategic_cooldown = delay;
        delay
    }

    /// One turn of cooldown recovery; returns true when it just reached zero
    pub fn tick_strategic_cooldown(&mut self) -> bool {
        if self.strategic_cooldown == 0 {
            return false;
        }
        self.strategic_cooldown -= 1;
        self.strategic_cooldown == 0
    }

    pub fn can_issue_strategic(&self) -> bool {
        self.strategic_cooldown == 0 && !self.destroyed
    }
}

/// Relative change to a nation's numeric fields
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NationDelta {
    pub gold: i64,
    pub rice: i64,
    pub tech: f64,
    pub general_count: i64,
}

impl NationDelta {
    pub fn gold(amount: i64) -> Self {
        Self { gold: amount, ..Default::default() }
    }

    pub fn rice(amount: i64) -> Self {
        Self { rice: amount, ..Default::default() }
    }

    pub fn tech(amount: f64) -> Self {
        Self { tech: amount, ..Default::default() }
    }

    pub fn is_zero(&self) -> bool {
        self.gold == 0 && self.rice == 0 && self.tech == 0.0 && self.general_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DoubleDelay;

    impl GameEventObserver for DoubleDelay {
        fn on_calc_strategic(&self, _command: StrategicCommand, base_delay: u32) -> u32 {
            base_delay * 2
        }
    }

    #[test]
    fn test_delta_floors_at_zero() {
        let mut nation = Nation::new(NationId(1), "Wei").with_treasury(100, 100);
        nation.apply(&NationDelta { gold: -500, rice: 50, tech: -3.0, general_count: -1 });
        assert_eq!(nation.treasury, Treasury::new(0, 150));
        assert_eq!(nation.tech, 0.0);
        assert_eq!(nation.general_count, 0);
    }

    #[test]
    fn test_strategic_cooldown_with_observer() {
        let mut nation = Nation::new(NationId(1), "Wei");
        let delay =
            nation.begin_strategic_cooldown(StrategicCommand::DeclareWar, 3, Some(&DoubleDelay));
        assert_eq!(delay, 6);
        assert!(!nation.can_issue_strategic());

        for _ in 0..5 {
            assert!(!nation.tick_strategic_cooldown());
        }
        assert!(nation.tick_strategic_cooldown());
        assert!(nation.can_issue_strategic());
        assert!(!nation.tick_strategic_cooldown());
    }

    #[test]
    fn test_strategic_cooldown_without_observer() {
        let mut nation = Nation::new(NationId(2), "Shu");
        assert_eq!(nation.begin_strategic_cooldown(StrategicCommand::ProposeAlliance, 4, None), 4);
    }
}
