//! Admin dashboard.
//!
//! A small axum surface over the engine: read views (health, accounts,
//! leaderboards), action endpoints that drive the accrual and wager
//! engines, and the administrative operations. Everything except /health
//! sits behind basic auth; write endpoints are rate limited per client IP.

mod auth;
mod error;
mod handlers;
mod router;
mod state;

pub use error::{ApiError, ApiResult};
pub use router::create_router;
pub use state::AppState;
