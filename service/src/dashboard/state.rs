use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::sync::RwLock;

use honor_engine::Engine;

use crate::config::DashboardConfig;
use crate::leaderboard_job::PublishedLeaderboard;
use crate::store_file::JsonFileStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine<JsonFileStore>>,
    pub published: Arc<RwLock<PublishedLeaderboard>>,
    pub auth_user: Arc<String>,
    pub auth_pass: Arc<Option<String>>,
    pub write_limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        engine: Arc<Engine<JsonFileStore>>,
        published: Arc<RwLock<PublishedLeaderboard>>,
        config: &DashboardConfig,
    ) -> Self {
        let per_minute =
            NonZeroU32::new(config.write_ops_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            engine,
            published,
            auth_user: Arc::new(config.auth_user.clone()),
            auth_pass: Arc::new(config.auth_pass.clone()),
            write_limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute))),
            started_at: Utc::now(),
        }
    }
}
