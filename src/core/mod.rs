pub mod calendar;
pub mod config;
pub mod error;
pub mod types;

pub use calendar::{Clock, GameDate, ManualClock, SystemClock, Timestamp};
pub use config::RealmConfig;
pub use error::{RealmError, Result, ValidationError};
