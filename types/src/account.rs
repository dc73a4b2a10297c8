use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::constants::MAX_DISPLAY_NAME_LENGTH;

/// Sentinel meaning "never happened". Window checks must test for this
/// explicitly before any calendar comparison; epoch's own calendar date is
/// never treated as a real day.
pub const EPOCH: DateTime<Utc> = DateTime::UNIX_EPOCH;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum AccountInvariantError {
    #[error("account id is empty")]
    EmptyId,
    #[error("display name too long (len={len}, max={max})")]
    NameTooLong { len: usize, max: usize },
}

/// Per-user account record: one document per external identity, created
/// lazily on the first observed action of any kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Opaque platform user id. Unique key.
    pub id: String,
    /// Cosmetic only; refreshed opportunistically from the latest caller
    /// supplied value on every access.
    pub display_name: String,
    /// Never stored negative; losses clamp at zero before write.
    pub balance: u64,

    /// Last message reward; drives the 60s cooldown.
    pub last_reward_at: DateTime<Utc>,
    /// Message rewards granted in the current UTC-day window.
    pub daily_reward_count: u32,
    /// When `daily_reward_count` was last reset.
    pub daily_window_started_at: DateTime<Utc>,

    /// Epoch means "never claimed"; any other past value is a real claim.
    pub last_checkin_at: DateTime<Utc>,
    pub checkin_streak: u32,

    /// Wager window, independent of the message window.
    pub last_wager_at: DateTime<Utc>,
    pub daily_wager_count: u32,

    /// Balance snapshot taken lazily at the first access in each UTC month;
    /// monthly points are derived from it rather than from a ledger.
    pub balance_at_month_start: u64,
    /// Month the snapshot belongs to (epoch until the first rollover).
    pub month_started_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// All window fields start at epoch so the very first action of every
    /// kind is eligible.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            balance: 0,
            last_reward_at: EPOCH,
            daily_reward_count: 0,
            daily_window_started_at: EPOCH,
            last_checkin_at: EPOCH,
            checkin_streak: 0,
            last_wager_at: EPOCH,
            daily_wager_count: 0,
            balance_at_month_start: 0,
            month_started_at: EPOCH,
            created_at: now,
        }
    }

    pub fn validate_invariants(&self) -> Result<(), AccountInvariantError> {
        if self.id.is_empty() {
            return Err(AccountInvariantError::EmptyId);
        }
        if self.display_name.len() > MAX_DISPLAY_NAME_LENGTH {
            return Err(AccountInvariantError::NameTooLong {
                len: self.display_name.len(),
                max: MAX_DISPLAY_NAME_LENGTH,
            });
        }
        Ok(())
    }

    /// Points earned since the stored month-start snapshot, clamped at zero.
    ///
    /// The stored snapshot may belong to an earlier month for accounts that
    /// have been idle across a boundary; callers that care pair this with a
    /// same-month check on `month_started_at`.
    pub fn monthly_earned(&self) -> u64 {
        self.balance.saturating_sub(self.balance_at_month_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_has_epoch_windows() {
        let now = Utc::now();
        let account = UserAccount::new("u1", "Wanderer", now);
        assert_eq!(account.balance, 0);
        assert_eq!(account.last_checkin_at, EPOCH);
        assert_eq!(account.last_reward_at, EPOCH);
        assert_eq!(account.last_wager_at, EPOCH);
        assert_eq!(account.month_started_at, EPOCH);
        assert_eq!(account.created_at, now);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let account = UserAccount::new("", "Wanderer", Utc::now());
        assert_eq!(
            account.validate_invariants(),
            Err(AccountInvariantError::EmptyId)
        );
    }

    #[test]
    fn test_validate_rejects_name_too_long() {
        let account = UserAccount::new("u1", "x".repeat(MAX_DISPLAY_NAME_LENGTH + 1), Utc::now());
        assert!(matches!(
            account.validate_invariants(),
            Err(AccountInvariantError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_monthly_earned_clamps_at_zero() {
        let mut account = UserAccount::new("u1", "Wanderer", Utc::now());
        account.balance = 3;
        account.balance_at_month_start = 10;
        assert_eq!(account.monthly_earned(), 0);

        account.balance = 25;
        assert_eq!(account.monthly_earned(), 15);
    }
}
