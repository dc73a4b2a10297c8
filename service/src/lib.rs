//! Host process pieces for the honor points engine: configuration, the
//! file-backed account store, the admin dashboard, and the leaderboard
//! rendering job. `main.rs` wires them together.

pub mod config;
pub mod dashboard;
pub mod leaderboard_job;
pub mod store_file;

pub use config::Config;
pub use store_file::JsonFileStore;
