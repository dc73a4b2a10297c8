//! Leaderboard rendering job.
//!
//! Recomputes the top and monthly rankings on a fixed cadence and whenever
//! a balance writer nudges the refresh handle, then publishes the result
//! for the dashboard to serve. The job is a pure reader; it needs no
//! coordination with account writers beyond accepting slightly stale
//! balances.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, warn};

use honor_engine::{leaderboard, AccountStore, Engine, LeaderboardEntry};

#[derive(Clone, Debug, Default, Serialize)]
pub struct PublishedLeaderboard {
    pub updated_at: Option<DateTime<Utc>>,
    pub top: Vec<LeaderboardEntry>,
    pub monthly: Vec<LeaderboardEntry>,
}

pub async fn run<S: AccountStore>(
    engine: Arc<Engine<S>>,
    published: Arc<RwLock<PublishedLeaderboard>>,
    size: usize,
    interval_secs: u64,
) {
    let refresh = engine.refresh_handle();
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first interval tick fires immediately, so the board is
        // populated right after startup.
        tokio::select! {
            _ = ticker.tick() => {}
            _ = refresh.wait() => {}
        }

        let now = Utc::now();
        let top = leaderboard::top_n(engine.store(), size).await;
        let monthly = leaderboard::monthly_top_n(engine.store(), size, now).await;
        match (top, monthly) {
            (Ok(top), Ok(monthly)) => {
                debug!(entries = top.len(), monthly = monthly.len(), "leaderboard refreshed");
                let mut slot = published.write().await;
                slot.updated_at = Some(now);
                slot.top = top;
                slot.monthly = monthly;
            }
            (Err(e), _) | (_, Err(e)) => {
                // Keep serving the previous rendering; the next tick retries.
                warn!(error = %e, "leaderboard refresh failed");
            }
        }
    }
}
