use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::account::{AccountInvariantError, UserAccount, EPOCH};
use crate::constants::MAX_DISPLAY_NAME_LENGTH;

/// Serialized per-account document, used both by the file store and by
/// backup export/import.
///
/// Deserialization is deliberately lenient: missing fields default,
/// unknown fields are ignored, timestamps that fail to parse collapse to
/// epoch, and numeric fields are clamped into range by
/// [`AccountRecord::into_account`]. A record is only rejected outright
/// when it has no usable id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountRecord {
    pub id: String,
    pub display_name: String,
    pub balance: i64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub last_reward_at: DateTime<Utc>,
    pub daily_reward_count: i64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub daily_window_started_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub last_checkin_at: DateTime<Utc>,
    pub checkin_streak: i64,
    #[serde(deserialize_with = "lenient_datetime")]
    pub last_wager_at: DateTime<Utc>,
    pub daily_wager_count: i64,
    /// Missing in older backups; defaults to `balance` so monthly points
    /// start at zero rather than the full balance.
    pub balance_at_month_start: Option<i64>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub month_started_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 strings, millisecond timestamps, or garbage; anything
/// unparseable becomes the epoch sentinel instead of failing the record.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s.parse::<DateTime<Utc>>().unwrap_or(EPOCH),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .unwrap_or(EPOCH),
        _ => EPOCH,
    })
}

impl AccountRecord {
    /// Clamp every field into range and produce the in-memory account.
    /// `now` backfills a missing creation time.
    pub fn into_account(self, now: DateTime<Utc>) -> Result<UserAccount, AccountInvariantError> {
        if self.id.is_empty() {
            return Err(AccountInvariantError::EmptyId);
        }

        let display_name = if self.display_name.is_empty() {
            "Unknown".to_string()
        } else {
            self.display_name
                .chars()
                .take(MAX_DISPLAY_NAME_LENGTH)
                .collect()
        };

        let balance = self.balance.max(0) as u64;
        let balance_at_month_start = self
            .balance_at_month_start
            .map(|v| v.max(0) as u64)
            .unwrap_or(balance);

        Ok(UserAccount {
            id: self.id,
            display_name,
            balance,
            last_reward_at: self.last_reward_at,
            daily_reward_count: clamp_count(self.daily_reward_count),
            daily_window_started_at: self.daily_window_started_at,
            last_checkin_at: self.last_checkin_at,
            checkin_streak: clamp_count(self.checkin_streak),
            last_wager_at: self.last_wager_at,
            daily_wager_count: clamp_count(self.daily_wager_count),
            balance_at_month_start,
            month_started_at: self.month_started_at,
            created_at: if self.created_at == EPOCH {
                now
            } else {
                self.created_at
            },
        })
    }
}

fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

impl From<&UserAccount> for AccountRecord {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id.clone(),
            display_name: account.display_name.clone(),
            balance: account.balance.min(i64::MAX as u64) as i64,
            last_reward_at: account.last_reward_at,
            daily_reward_count: account.daily_reward_count as i64,
            daily_window_started_at: account.daily_window_started_at,
            last_checkin_at: account.last_checkin_at,
            checkin_streak: account.checkin_streak as i64,
            last_wager_at: account.last_wager_at,
            daily_wager_count: account.daily_wager_count as i64,
            balance_at_month_start: Some(account.balance_at_month_start.min(i64::MAX as u64) as i64),
            month_started_at: account.month_started_at,
            created_at: account.created_at,
        }
    }
}

/// Per-record result counts for a bulk import. Bad records are counted
/// and skipped; they never abort the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub updated: usize,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let now = Utc::now();
        let mut account = UserAccount::new("u1", "Wanderer", now);
        account.balance = 42;
        account.daily_reward_count = 3;
        account.checkin_streak = 7;
        account.balance_at_month_start = 30;

        let record = AccountRecord::from(&account);
        let restored = record.into_account(now).expect("valid record");
        assert_eq!(restored, account);
    }

    #[test]
    fn test_import_clamps_negative_numbers() {
        let json = r#"{
            "id": "u1",
            "display_name": "Wanderer",
            "balance": -50,
            "daily_reward_count": -2,
            "checkin_streak": -1
        }"#;
        let record: AccountRecord = serde_json::from_str(json).expect("lenient parse");
        let account = record.into_account(Utc::now()).expect("usable record");
        assert_eq!(account.balance, 0);
        assert_eq!(account.daily_reward_count, 0);
        assert_eq!(account.checkin_streak, 0);
    }

    #[test]
    fn test_import_treats_bad_dates_as_epoch() {
        let json = r#"{
            "id": "u1",
            "display_name": "Wanderer",
            "balance": 5,
            "last_checkin_at": "not a date",
            "last_reward_at": 12345,
            "last_wager_at": null
        }"#;
        let record: AccountRecord = serde_json::from_str(json).expect("lenient parse");
        assert_eq!(record.last_checkin_at, EPOCH);
        assert_eq!(
            record.last_reward_at,
            Utc.timestamp_millis_opt(12345).single().expect("valid ms")
        );
        assert_eq!(record.last_wager_at, EPOCH);
    }

    #[test]
    fn test_import_defaults_month_snapshot_to_balance() {
        let json = r#"{"id": "u1", "display_name": "Wanderer", "balance": 80}"#;
        let record: AccountRecord = serde_json::from_str(json).expect("lenient parse");
        let account = record.into_account(Utc::now()).expect("usable record");
        assert_eq!(account.balance_at_month_start, 80);
        assert_eq!(account.monthly_earned(), 0);
    }

    #[test]
    fn test_import_rejects_missing_id() {
        let json = r#"{"display_name": "Nobody", "balance": 5}"#;
        let record: AccountRecord = serde_json::from_str(json).expect("lenient parse");
        assert_eq!(
            record.into_account(Utc::now()),
            Err(AccountInvariantError::EmptyId)
        );
    }

    #[test]
    fn test_import_truncates_long_names() {
        let long = "x".repeat(MAX_DISPLAY_NAME_LENGTH + 20);
        let json = format!(r#"{{"id": "u1", "display_name": "{long}", "balance": 1}}"#);
        let record: AccountRecord = serde_json::from_str(&json).expect("lenient parse");
        let account = record.into_account(Utc::now()).expect("usable record");
        assert_eq!(account.display_name.chars().count(), MAX_DISPLAY_NAME_LENGTH);
    }
}
