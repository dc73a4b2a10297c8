//! Engine orchestrator.
//!
//! Owns the store handle, the rule configuration, the RNG, the per-account
//! locks, and the dedup set. Every externally triggered action runs as one
//! serialized read-modify-write against its account: load or create,
//! refresh cosmetic state, roll lazy windows, run the transition, persist,
//! report. Nothing is committed when persistence fails.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error as ThisError;
use tracing::{debug, info};

use honor_types::{
    ActionOutcome, BlockReason, CoinSide, UserAccount, DAILY_MESSAGE_REWARD_LIMIT,
    DAILY_WAGER_LIMIT, DEDUP_HORIZON_SECS, MAX_DISPLAY_NAME_LENGTH,
    MESSAGE_REWARD_COOLDOWN_SECS, WIPE_CONFIRM_EXPIRY_SECS,
};

use crate::accrual;
use crate::dedup::EventDedup;
use crate::leaderboard::RefreshHandle;
use crate::store::{AccountStore, StoreError};
use crate::wager::{self, WagerRules};

#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("account store failure: {0}")]
    Store(#[from] StoreError),
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    #[error("confirmation missing, expired, or mismatched")]
    ConfirmationInvalid,
    #[error("invalid import payload: {0}")]
    InvalidImport(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Engine rule configuration. Loaded from the service config file; every
/// field has a production default.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When false, check-ins never touch the streak counter.
    pub streak_enabled: bool,
    pub message_cooldown_secs: i64,
    pub daily_message_limit: u32,
    pub daily_wager_limit: u32,
    pub wager_rules: WagerRules,
    pub dedup_horizon_secs: i64,
    pub wipe_confirm_expiry_secs: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            streak_enabled: true,
            message_cooldown_secs: MESSAGE_REWARD_COOLDOWN_SECS,
            daily_message_limit: DAILY_MESSAGE_REWARD_LIMIT,
            daily_wager_limit: DAILY_WAGER_LIMIT,
            wager_rules: WagerRules::default(),
            dedup_horizon_secs: DEDUP_HORIZON_SECS,
            wipe_confirm_expiry_secs: WIPE_CONFIRM_EXPIRY_SECS,
        }
    }
}

pub(crate) struct PendingWipe {
    pub(crate) token: u64,
    pub(crate) expires_at: DateTime<Utc>,
}

pub struct Engine<S> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
    pub(crate) refresh: RefreshHandle,
    pub(crate) dedup: EventDedup,
    pub(crate) pending_wipe: StdMutex<Option<PendingWipe>>,
    rng: StdMutex<StdRng>,
    locks: StdMutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: AccountStore> Engine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_rng(store, config, StdRng::from_entropy())
    }

    /// Deterministic draws for tests.
    pub fn with_rng_seed(store: S, config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(store, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: S, config: EngineConfig, rng: StdRng) -> Self {
        let dedup = EventDedup::new(config.dedup_horizon_secs);
        Self {
            store,
            config,
            refresh: RefreshHandle::new(),
            dedup,
            pending_wipe: StdMutex::new(None),
            rng: StdMutex::new(rng),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Handle balance-change consumers (the leaderboard job) subscribe to.
    pub fn refresh_handle(&self) -> RefreshHandle {
        self.refresh.clone()
    }

    /// One mutex per account id; the map lives as long as the engine and is
    /// bounded by the number of distinct accounts seen.
    pub(crate) fn lock_for(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    pub(crate) fn draw_roll(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(0.0..100.0)
    }

    pub(crate) fn draw_token(&self) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen()
    }

    /// Load the account, creating it on first sight. Returns whether the
    /// record carries changes that must persist even if the action itself
    /// ends blocked (creation, display-name refresh).
    async fn load_or_create(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(UserAccount, bool), EngineError> {
        let mut dirty = false;
        let mut account = match self.store.get(id).await? {
            Some(account) => account,
            None => {
                let name = if display_name.is_empty() {
                    "Unknown"
                } else {
                    display_name
                };
                dirty = true;
                UserAccount::new(id, truncate_name(name), now)
            }
        };
        if !display_name.is_empty() && account.display_name != display_name {
            account.display_name = truncate_name(display_name);
            dirty = true;
        }
        Ok((account, dirty))
    }

    async fn finish(
        &self,
        account: UserAccount,
        dirty: bool,
        persist: bool,
    ) -> Result<(), EngineError> {
        if persist || dirty {
            self.store.upsert(account).await?;
        }
        Ok(())
    }

    /// Daily check-in claim for `id`.
    pub async fn checkin(
        &self,
        id: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let (mut account, dirty) = self.load_or_create(id, display_name, now).await?;
        accrual::roll_month(&mut account, now);

        let roll = self.draw_roll();
        let outcome = accrual::claim_checkin(&mut account, now, roll, self.config.streak_enabled);
        match &outcome {
            ActionOutcome::Awarded { points, new_balance } => {
                let streak = account.checkin_streak;
                self.finish(account, dirty, true).await?;
                info!(user = id, points, balance = new_balance, streak, "daily check-in claimed");
            }
            _ => {
                self.finish(account, dirty, false).await?;
                debug!(user = id, "check-in blocked: already claimed today");
            }
        }
        Ok(outcome)
    }

    /// Message-activity reward for one inbound (human, non-empty) message.
    /// `event_id`, when present, is rejected if it was already processed
    /// within the dedup horizon.
    pub async fn message_activity(
        &self,
        id: &str,
        display_name: &str,
        event_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        // Checked under the account lock: two concurrent deliveries of the
        // same event serialize here, and the second sees the first's record.
        if let Some(event_id) = event_id {
            if self.dedup.contains(event_id, now) {
                debug!(user = id, event_id, "duplicate message event ignored");
                return Ok(ActionOutcome::Blocked {
                    reason: BlockReason::DuplicateEvent,
                });
            }
        }

        let (mut account, dirty) = self.load_or_create(id, display_name, now).await?;
        accrual::roll_month(&mut account, now);

        let roll = self.draw_roll();
        let outcome = accrual::award_message(
            &mut account,
            now,
            roll,
            self.config.message_cooldown_secs,
            self.config.daily_message_limit,
        );
        match &outcome {
            ActionOutcome::Awarded { points, new_balance } => {
                let count = account.daily_reward_count;
                self.finish(account, dirty, true).await?;
                info!(
                    user = id,
                    points,
                    balance = new_balance,
                    daily = count,
                    "message reward granted"
                );
            }
            _ => {
                self.finish(account, dirty, false).await?;
                debug!(user = id, "message reward blocked");
            }
        }
        // Only record after the mutation committed, so a failed write keeps
        // the event replayable.
        if let Some(event_id) = event_id {
            self.dedup.record(event_id, now);
        }
        Ok(outcome)
    }

    /// Resolve a wager under the configured rules. Any balance-affecting
    /// resolution nudges the leaderboard job; the nudge never fails the
    /// wager.
    pub async fn place_wager(
        &self,
        id: &str,
        display_name: &str,
        stake: u64,
        choice: CoinSide,
        now: DateTime<Utc>,
    ) -> Result<ActionOutcome, EngineError> {
        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let (mut account, dirty) = self.load_or_create(id, display_name, now).await?;
        accrual::roll_month(&mut account, now);

        let roll = self.draw_roll();
        let outcome = wager::place_wager(
            &mut account,
            &self.config.wager_rules,
            stake,
            choice,
            now,
            roll,
            self.config.daily_wager_limit,
        );
        match &outcome {
            ActionOutcome::WagerResolved {
                won,
                delta,
                new_balance,
                plays_today,
                ..
            } => {
                self.finish(account, dirty, true).await?;
                info!(
                    user = id,
                    won,
                    delta,
                    balance = new_balance,
                    plays = plays_today,
                    "wager resolved"
                );
                self.refresh.notify();
            }
            _ => {
                self.finish(account, dirty, false).await?;
                debug!(user = id, "wager rejected");
            }
        }
        Ok(outcome)
    }

    /// Read-only account fetch (dashboard views).
    pub async fn account(&self, id: &str) -> Result<Option<UserAccount>, EngineError> {
        Ok(self.store.get(id).await?)
    }
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_DISPLAY_NAME_LENGTH).collect()
}
