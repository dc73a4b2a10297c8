//! Common types for the honor points engine.
//!
//! Defines the per-user account record, the outcome vocabulary returned to
//! callers, the tunable rule constants, and the lenient backup/import
//! document format.

pub mod account;
pub mod backup;
pub mod constants;
pub mod outcome;

pub use account::{AccountInvariantError, UserAccount, EPOCH};
pub use backup::{AccountRecord, ImportReport};
pub use constants::*;
pub use outcome::{ActionOutcome, BlockReason, CoinSide};
