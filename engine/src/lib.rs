//! Honor points engine.
//!
//! This crate contains the points-accrual and time-windowed-quota logic: the
//! rules governing when a user may earn or wager points, how much they earn,
//! how daily and monthly windows reset, and how concurrent triggers are
//! reconciled against one mutable per-user balance.
//!
//! ## Design requirements
//! - Window resets are lazy: recomputed on access, never by a background
//!   timer. Calling an eligibility check twice without crossing a boundary
//!   must never reset twice.
//! - All mutations for one account id serialize through a per-id lock held
//!   for exactly one read-modify-write cycle.
//! - Reward draws are pure functions over an injected uniform sample so the
//!   weighted tables are testable without an RNG.
//! - A persistence failure aborts the mutation; no partial credit is ever
//!   observable.
//!
//! The primary entrypoint is [`Engine`].

pub mod accrual;
pub mod admin;
pub mod dedup;
pub mod leaderboard;
pub mod rewards;
pub mod store;
pub mod wager;
pub mod window;

mod engine;

pub use admin::WipeConfirmation;
pub use dedup::EventDedup;
pub use engine::{Engine, EngineConfig, EngineError};
pub use leaderboard::{LeaderboardEntry, RefreshHandle};
pub use store::{AccountStore, MemoryStore, StoreError};
pub use wager::WagerRules;
