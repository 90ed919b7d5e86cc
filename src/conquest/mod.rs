//! City conquest resolution
//!
//! Decides the new owner of a contested city, flags nation destruction,
//! relocates a lost capital, and resets the city. The destruction cascade
//! is a separate step the caller may defer.

mod destroy;
mod plan;
mod resolve;

pub use destroy::{destroy_nation, release_loss, DestructionReport};
pub use plan::{
    plan_conquest, relocate_capital, reset_city, resolve_owner, CapitalRelocation, ConquestInput,
    ConquestPlan,
};
pub use resolve::{resolve_conquest, ConquestResult};
