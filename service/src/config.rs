//! Service configuration.
//!
//! One YAML file covers the dashboard, the store location, the engine rules,
//! and the leaderboard job. Every field has a default so a missing file
//! still yields a runnable (local, unauthenticated-disabled) service.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

use honor_engine::EngineConfig;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dashboard: DashboardConfig,
    pub store: StoreConfig,
    pub engine: EngineConfig,
    pub leaderboard: LeaderboardConfig,
    /// Default tracing filter; the RUST_LOG environment variable wins.
    pub log_filter: LogFilter,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(transparent)]
pub struct LogFilter(pub String);

impl Default for LogFilter {
    fn default() -> Self {
        Self("info".to_string())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub listen: SocketAddr,
    pub auth_user: String,
    /// Basic-auth password for everything except /health. When unset, the
    /// authenticated surface rejects all requests; there is no default
    /// password.
    pub auth_pass: Option<String>,
    /// Keyed (per client IP) budget for write endpoints.
    pub write_ops_per_minute: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".parse().unwrap_or_else(|_| {
                SocketAddr::from(([127, 0, 0, 1], 3000))
            }),
            auth_user: "admin".to_string(),
            auth_pass: None,
            write_ops_per_minute: 50,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("accounts.json"),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Periodic refresh cadence; balance changes also trigger refreshes
    /// out of band.
    pub interval_secs: u64,
    pub size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            interval_secs: 180,
            size: 10,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        serde_yaml::from_str(&contents).context("Could not parse config file")
    }
}
