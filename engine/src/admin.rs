//! Administrative operations.
//!
//! Direct overrides that bypass the accrual rules. They still uphold the
//! storage invariants (balances clamp at zero, whole-document writes) and
//! nudge the leaderboard when a balance changes. The destructive wipe is
//! gated behind a two-step confirmation token with a short expiry; the
//! calling layer owns the human-facing confirmation flow.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use honor_types::{AccountRecord, ImportReport, MAX_IMPORT_RECORDS};

use crate::engine::{Engine, EngineError, PendingWipe};
use crate::store::AccountStore;
use crate::window;

/// Token the caller must echo back to confirm a wipe.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct WipeConfirmation {
    pub token: u64,
    pub expires_at: DateTime<Utc>,
}

impl<S: AccountStore> Engine<S> {
    /// Overwrite an account's balance. Bypasses accrual rules and the
    /// monthly snapshot: admin edits are outside monthly-points accounting,
    /// so `monthly_earned` will not reflect this change (it clamps at zero
    /// if the edit lowers the balance below the snapshot).
    pub async fn set_balance(&self, id: &str, balance: u64) -> Result<u64, EngineError> {
        let lock = self.lock_for_admin(id);
        let _guard = lock.lock().await;

        let mut account = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(id.to_string()))?;
        let previous = account.balance;
        account.balance = balance;
        self.store.upsert(account).await?;
        info!(user = id, previous, balance, "balance overridden");
        self.refresh.notify();
        Ok(balance)
    }

    pub async fn reset_streak(&self, id: &str) -> Result<(), EngineError> {
        let lock = self.lock_for_admin(id);
        let _guard = lock.lock().await;

        let mut account = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::UnknownAccount(id.to_string()))?;
        account.checkin_streak = 0;
        self.store.upsert(account).await?;
        info!(user = id, "check-in streak reset");
        Ok(())
    }

    /// Re-open the daily check-in by epoching the claim marker, for one
    /// account or for all of them. Returns the number of accounts touched.
    pub async fn reset_checkin(&self, id: Option<&str>) -> Result<usize, EngineError> {
        match id {
            Some(id) => {
                let lock = self.lock_for_admin(id);
                let _guard = lock.lock().await;

                let mut account = self
                    .store
                    .get(id)
                    .await?
                    .ok_or_else(|| EngineError::UnknownAccount(id.to_string()))?;
                account.last_checkin_at = honor_types::EPOCH;
                self.store.upsert(account).await?;
                info!(user = id, "daily check-in reset");
                Ok(1)
            }
            None => {
                let accounts = self.store.all().await?;
                let mut touched = 0;
                for mut account in accounts {
                    account.last_checkin_at = honor_types::EPOCH;
                    self.store.upsert(account).await?;
                    touched += 1;
                }
                info!(touched, "daily check-in reset for all accounts");
                Ok(touched)
            }
        }
    }

    /// First step of the irreversible wipe: issue a confirmation token.
    /// Re-requesting replaces any outstanding token.
    pub fn begin_wipe(&self, now: DateTime<Utc>) -> WipeConfirmation {
        let token = self.draw_token();
        let expires_at = now + Duration::seconds(self.config.wipe_confirm_expiry_secs);
        let mut pending = self
            .pending_wipe
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *pending = Some(PendingWipe { token, expires_at });
        warn!(%expires_at, "account wipe requested, awaiting confirmation");
        WipeConfirmation { token, expires_at }
    }

    /// Second step: the echoed token must match and still be live. The
    /// token is consumed either way.
    pub async fn confirm_wipe(&self, token: u64, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let pending = {
            let mut slot = self
                .pending_wipe
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            slot.take()
        };
        match pending {
            Some(p) if p.token == token && now < p.expires_at => {
                let removed = self.store.remove_all().await?;
                warn!(removed, "all accounts wiped");
                self.refresh.notify();
                Ok(removed)
            }
            _ => Err(EngineError::ConfirmationInvalid),
        }
    }

    /// Pretty-printed JSON of every account, in the lenient record format
    /// that `import_all` accepts.
    pub async fn export_all(&self) -> Result<String, EngineError> {
        let accounts = self.store.all().await?;
        let records: Vec<AccountRecord> = accounts.iter().map(AccountRecord::from).collect();
        info!(count = records.len(), "accounts exported");
        serde_json::to_string_pretty(&records).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Upsert accounts from a JSON array of records. Bad records are
    /// counted and skipped; the batch never aborts part-way. Only the
    /// payload being something other than a JSON array (or exceeding the
    /// batch cap) rejects the whole call.
    pub async fn import_all(&self, json: &str, now: DateTime<Utc>) -> Result<ImportReport, EngineError> {
        let values: Vec<serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidImport(format!("not a JSON array: {e}")))?;
        if values.len() > MAX_IMPORT_RECORDS {
            return Err(EngineError::InvalidImport(format!(
                "batch of {} exceeds the {} record cap",
                values.len(),
                MAX_IMPORT_RECORDS
            )));
        }

        let mut report = ImportReport::default();
        for (index, value) in values.into_iter().enumerate() {
            let record: AccountRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!(index, error = %e, "import record skipped: malformed");
                    report.errors += 1;
                    continue;
                }
            };
            let account = match record.into_account(now) {
                Ok(account) => account,
                Err(e) => {
                    warn!(index, error = %e, "import record skipped: invalid");
                    report.errors += 1;
                    continue;
                }
            };

            let lock = self.lock_for_admin(&account.id);
            let _guard = lock.lock().await;
            let existed = self.store.get(&account.id).await?.is_some();
            self.store.upsert(account).await?;
            if existed {
                report.updated += 1;
            } else {
                report.imported += 1;
            }
        }

        info!(
            imported = report.imported,
            updated = report.updated,
            errors = report.errors,
            "import finished"
        );
        self.refresh.notify();
        Ok(report)
    }

    /// Re-anchor every account's monthly snapshot at the start of the
    /// current month. Never touches balances.
    pub async fn snapshot_month_start(&self, now: DateTime<Utc>) -> Result<usize, EngineError> {
        let month_start = window::start_of_utc_month(now);
        let accounts = self.store.all().await?;
        let mut touched = 0;
        for mut account in accounts {
            account.balance_at_month_start = account.balance;
            account.month_started_at = month_start;
            self.store.upsert(account).await?;
            touched += 1;
        }
        info!(touched, %month_start, "monthly snapshot re-anchored");
        Ok(touched)
    }

    /// Admin writes serialize against user-triggered writes on the same
    /// account through the same per-id lock.
    fn lock_for_admin(&self, id: &str) -> std::sync::Arc<tokio::sync::Mutex<()>> {
        self.lock_for(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::store::MemoryStore;
    use crate::{accrual, leaderboard};
    use chrono::TimeZone;
    use honor_types::{ActionOutcome, EPOCH};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid date")
    }

    fn engine() -> Engine<MemoryStore> {
        Engine::with_rng_seed(MemoryStore::new(), EngineConfig::default(), 42)
    }

    async fn seed(engine: &Engine<MemoryStore>, id: &str, now: DateTime<Utc>) {
        let outcome = engine.checkin(id, id, now).await.expect("checkin");
        assert!(matches!(outcome, ActionOutcome::Awarded { .. }));
    }

    #[tokio::test]
    async fn test_set_balance_overrides_and_skips_monthly_accounting() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;

        engine.set_balance("u1", 500).await.expect("set");
        let account = engine.account("u1").await.expect("get").expect("exists");
        assert_eq!(account.balance, 500);
        // The snapshot was not adjusted, so the override inflates the
        // derived monthly view; this is the documented trade-off.
        assert!(accrual::monthly_earned(&account, now) >= 500 - account.balance_at_month_start);

        assert!(matches!(
            engine.set_balance("ghost", 1).await,
            Err(EngineError::UnknownAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_streak_and_checkin() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;
        seed(&engine, "u2", now).await;

        engine.reset_streak("u1").await.expect("reset");
        let account = engine.account("u1").await.expect("get").expect("exists");
        assert_eq!(account.checkin_streak, 0);

        // Epoching the marker makes the same day claimable again.
        assert_eq!(engine.reset_checkin(None).await.expect("reset"), 2);
        let account = engine.account("u1").await.expect("get").expect("exists");
        assert_eq!(account.last_checkin_at, EPOCH);
        let outcome = engine.checkin("u1", "u1", now).await.expect("checkin");
        assert!(matches!(outcome, ActionOutcome::Awarded { .. }));
    }

    #[tokio::test]
    async fn test_wipe_requires_live_matching_token() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;

        // Wrong token.
        let confirmation = engine.begin_wipe(now);
        assert!(matches!(
            engine
                .confirm_wipe(confirmation.token.wrapping_add(1), now)
                .await,
            Err(EngineError::ConfirmationInvalid)
        ));
        // The mismatched attempt consumed the token.
        assert!(matches!(
            engine.confirm_wipe(confirmation.token, now).await,
            Err(EngineError::ConfirmationInvalid)
        ));

        // Expired token.
        let confirmation = engine.begin_wipe(now);
        let late = now + Duration::seconds(31);
        assert!(matches!(
            engine.confirm_wipe(confirmation.token, late).await,
            Err(EngineError::ConfirmationInvalid)
        ));

        // Fresh token within the window wipes everything.
        let confirmation = engine.begin_wipe(now);
        let removed = engine
            .confirm_wipe(confirmation.token, now + Duration::seconds(5))
            .await
            .expect("wipe");
        assert_eq!(removed, 1);
        assert_eq!(engine.store().count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;
        seed(&engine, "u2", now).await;

        let json = engine.export_all().await.expect("export");

        let fresh = Engine::with_rng_seed(MemoryStore::new(), EngineConfig::default(), 1);
        let report = fresh.import_all(&json, now).await.expect("import");
        assert_eq!(report.imported, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.errors, 0);

        let original = engine.account("u1").await.expect("get").expect("exists");
        let restored = fresh.account("u1").await.expect("get").expect("exists");
        assert_eq!(original, restored);
    }

    #[tokio::test]
    async fn test_import_continues_past_bad_records() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;

        let json = r#"[
            {"id": "u1", "display_name": "Updated", "balance": 10},
            {"display_name": "no id", "balance": 3},
            {"id": "u3", "display_name": "Fresh", "balance": -7},
            "not an object"
        ]"#;
        let report = engine.import_all(json, now).await.expect("import");
        assert_eq!(report.updated, 1);
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors, 2);

        let u1 = engine.account("u1").await.expect("get").expect("exists");
        assert_eq!(u1.display_name, "Updated");
        assert_eq!(u1.balance, 10);
        let u3 = engine.account("u3").await.expect("get").expect("exists");
        assert_eq!(u3.balance, 0);

        assert!(matches!(
            engine.import_all(r#"{"id": "u9"}"#, now).await,
            Err(EngineError::InvalidImport(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_month_start_preserves_balances() {
        let engine = engine();
        let now = utc(2024, 3, 14, 9, 0, 0);
        seed(&engine, "u1", now).await;
        engine.set_balance("u1", 120).await.expect("set");

        let touched = engine.snapshot_month_start(now).await.expect("snapshot");
        assert_eq!(touched, 1);

        let account = engine.account("u1").await.expect("get").expect("exists");
        assert_eq!(account.balance, 120);
        assert_eq!(account.balance_at_month_start, 120);
        assert_eq!(account.month_started_at, utc(2024, 3, 1, 0, 0, 0));
        assert_eq!(accrual::monthly_earned(&account, now), 0);

        // The monthly leaderboard starts empty after a re-anchor.
        let top = leaderboard::monthly_top_n(engine.store(), 10, now)
            .await
            .expect("monthly");
        assert!(top.is_empty());
    }
}
