//! Narrative and audit log
//!
//! The engine reports what happened as structured events; wording and
//! localization belong to whoever renders the chronicle.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::core::calendar::GameDate;
use crate::core::types::{AuctionId, CityId, GeneralId, NationId, ShardId};
use crate::diplomacy::RelationState;

/// How the renderer should frame an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogFormatType {
    RawText,
    Plain,
    YearMonth,
    EventYearMonth,
    Notice,
    NoticeYearMonth,
}

/// Which feed an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogCategory {
    WorldHistory,
    NationHistory,
    GeneralAction,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Notice,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChronicleEvent {
    ConquestSucceeded { general: GeneralId, city: CityId, nation: NationId },
    CityChangedHands { city: CityId, from: NationId, to: NationId },
    CapitalRelocated { nation: NationId, from: CityId, to: Option<CityId> },
    NationDestroyed { nation: NationId, by: NationId },
    WarStarted { a: NationId, b: NationId },
    TreatyExpired { a: NationId, b: NationId, treaty: RelationState },
    AuctionOpened { auction: AuctionId, amount: u64 },
    AuctionSettled { auction: AuctionId, winner: GeneralId, price: u64 },
    AuctionExpired { auction: AuctionId },
}

impl ChronicleEvent {
    pub fn category(&self) -> LogCategory {
        match self {
            ChronicleEvent::ConquestSucceeded { .. } => LogCategory::GeneralAction,
            ChronicleEvent::CityChangedHands { .. }
            | ChronicleEvent::NationDestroyed { .. }
            | ChronicleEvent::WarStarted { .. } => LogCategory::WorldHistory,
            ChronicleEvent::CapitalRelocated { .. } | ChronicleEvent::TreatyExpired { .. } => {
                LogCategory::NationHistory
            }
            ChronicleEvent::AuctionOpened { .. }
            | ChronicleEvent::AuctionSettled { .. }
            | ChronicleEvent::AuctionExpired { .. } => LogCategory::Market,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ChronicleEvent::NationDestroyed { .. } | ChronicleEvent::WarStarted { .. } => {
                Severity::Critical
            }
            ChronicleEvent::CityChangedHands { .. } | ChronicleEvent::CapitalRelocated { .. } => {
                Severity::Notice
            }
            _ => Severity::Info,
        }
    }

    pub fn format(&self) -> LogFormatType {
        match self.severity() {
            Severity::Critical => LogFormatType::NoticeYearMonth,
            Severity::Notice => LogFormatType::EventYearMonth,
            Severity::Info => match self.category() {
                LogCategory::Market => LogFormatType::Plain,
                _ => LogFormatType::YearMonth,
            },
        }
    }
}

/// A recorded chronicle line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicleEntry {
    pub id: u64,
    pub shard: ShardId,
    pub date: GameDate,
    pub category: LogCategory,
    pub severity: Severity,
    pub format: LogFormatType,
    pub event: ChronicleEvent,
}

/// Sink for narrative entries
pub trait Chronicle: Send + Sync {
    fn record(&self, shard: ShardId, date: GameDate, event: ChronicleEvent);
}

/// Chronicle that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullChronicle;

impl Chronicle for NullChronicle {
    fn record(&self, _shard: ShardId, _date: GameDate, _event: ChronicleEvent) {}
}

/// In-memory chronicle
#[derive(Debug, Default)]
pub struct ChronicleLog {
    entries: Mutex<Vec<ChronicleEntry>>,
}

impl ChronicleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ChronicleEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for_shard(&self, shard: ShardId) -> Vec<ChronicleEvent> {
        self.entries()
            .into_iter()
            .filter(|e| e.shard == shard)
            .map(|e| e.event)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries())
    }
}

impl Chronicle for ChronicleLog {
    fn record(&self, shard: ShardId, date: GameDate, event: ChronicleEvent) {
        tracing::debug!(%shard, ?event, "chronicle");
        if let Ok(mut entries) = self.entries.lock() {
            let id = entries.len() as u64;
            entries.push(ChronicleEntry {
                id,
                shard,
                date,
                category: event.category(),
                severity: event.severity(),
                format: event.format(),
                event,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_get_sequential_ids() {
        let log = ChronicleLog::new();
        let date = GameDate::new(190, 1);
        log.record(ShardId(1), date, ChronicleEvent::AuctionExpired { auction: AuctionId(1) });
        log.record(ShardId(2), date, ChronicleEvent::WarStarted { a: NationId(1), b: NationId(2) });

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, 1);
        assert_eq!(entries[1].severity, Severity::Critical);
        assert_eq!(entries[1].format, LogFormatType::NoticeYearMonth);
        assert_eq!(log.events_for_shard(ShardId(1)).len(), 1);
    }

    #[test]
    fn test_categories() {
        let e = ChronicleEvent::AuctionSettled {
            auction: AuctionId(3),
            winner: GeneralId(1),
            price: 10,
        };
        assert_eq!(e.category(), LogCategory::Market);
        assert_eq!(e.format(), LogFormatType::Plain);
        let e = ChronicleEvent::ConquestSucceeded {
            general: GeneralId(1),
            city: CityId(1),
            nation: NationId(1),
        };
        assert_eq!(e.format(), LogFormatType::YearMonth);
    }

    #[test]
    fn test_json_export() {
        let log = ChronicleLog::new();
        log.record(ShardId(1), GameDate::new(190, 2), ChronicleEvent::NationDestroyed {
            nation: NationId(4),
            by: NationId(1),
        });
        let json = log.to_json().unwrap();
        assert!(json.contains("NationDestroyed"));
    }
}
