//! Accrual state machines.
//!
//! Pure transition functions over `(&mut UserAccount, now, roll)`. The
//! engine owns locking, persistence, and the RNG; these functions decide
//! eligibility, apply the mutation in memory, and report the outcome.
//! Blocks leave the caller free to discard the account unchanged — every
//! in-memory mutation on a blocked path is a lazy reset that the next
//! access would re-derive identically.

use chrono::{DateTime, Duration, Utc};

use honor_types::{ActionOutcome, BlockReason, UserAccount};

use crate::rewards;
use crate::window;

/// Lazy monthly snapshot rollover, applied on every account access. The
/// first access in a new UTC month (or ever) snapshots the balance so
/// monthly points restart at zero.
pub fn roll_month(account: &mut UserAccount, now: DateTime<Utc>) -> bool {
    if window::is_same_utc_month(now, account.month_started_at) {
        return false;
    }
    account.balance_at_month_start = account.balance;
    account.month_started_at = now;
    true
}

/// Points earned this month as of `now`; zero when the stored snapshot
/// belongs to an earlier month (idle account that has not rolled yet).
pub fn monthly_earned(account: &UserAccount, now: DateTime<Utc>) -> u64 {
    if window::is_same_utc_month(now, account.month_started_at) {
        account.monthly_earned()
    } else {
        0
    }
}

/// Daily check-in claim.
///
/// One claim per UTC day; epoch `last_checkin_at` means never claimed and is
/// always eligible. The streak increments only when the previous claim was
/// exactly yesterday, resets to 1 otherwise, and is left untouched when the
/// feature is disabled.
pub fn claim_checkin(
    account: &mut UserAccount,
    now: DateTime<Utc>,
    roll: f64,
    streak_enabled: bool,
) -> ActionOutcome {
    if window::is_same_utc_day(now, account.last_checkin_at) {
        return ActionOutcome::Blocked {
            reason: BlockReason::AlreadyCheckedIn {
                retry_at: window::next_utc_midnight(now),
            },
        };
    }

    let points = rewards::checkin_points(roll);
    if streak_enabled {
        account.checkin_streak = if window::is_previous_utc_day(now, account.last_checkin_at) {
            account.checkin_streak.saturating_add(1)
        } else {
            1
        };
    }
    account.balance = account.balance.saturating_add(points);
    account.last_checkin_at = now;

    ActionOutcome::Awarded {
        points,
        new_balance: account.balance,
    }
}

/// Message-activity reward.
///
/// The caller has already filtered out non-human senders and empty content.
/// Order matters: lazy daily reset first, then the daily limit, then the
/// cooldown, so a stale counter can never block a new day's first message.
pub fn award_message(
    account: &mut UserAccount,
    now: DateTime<Utc>,
    roll: f64,
    cooldown_secs: i64,
    daily_limit: u32,
) -> ActionOutcome {
    if window::is_new_utc_day(now, account.daily_window_started_at) {
        account.daily_reward_count = 0;
        account.daily_window_started_at = now;
    }

    if account.daily_reward_count >= daily_limit {
        return ActionOutcome::Blocked {
            reason: BlockReason::DailyLimitReached {
                retry_at: window::next_utc_midnight(now),
            },
        };
    }

    if window::is_within_cooldown(now, account.last_reward_at, cooldown_secs) {
        return ActionOutcome::Blocked {
            reason: BlockReason::OnCooldown {
                retry_at: account.last_reward_at + Duration::seconds(cooldown_secs),
            },
        };
    }

    let points = rewards::message_points(roll);
    account.balance = account.balance.saturating_add(points);
    account.daily_reward_count += 1;
    account.last_reward_at = now;

    ActionOutcome::Awarded {
        points,
        new_balance: account.balance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use honor_types::account::EPOCH;
    use honor_types::{DAILY_MESSAGE_REWARD_LIMIT, MESSAGE_REWARD_COOLDOWN_SECS};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid date")
    }

    fn account() -> UserAccount {
        UserAccount::new("u1", "Wanderer", utc(2024, 3, 1, 8, 0, 0))
    }

    #[test]
    fn test_first_checkin_always_eligible() {
        // Scenario A: lastCheckinAt == epoch must never read as "today".
        let mut account = account();
        assert_eq!(account.last_checkin_at, EPOCH);

        let outcome = claim_checkin(&mut account, utc(2024, 3, 14, 9, 0, 0), 0.0, true);
        match outcome {
            ActionOutcome::Awarded { points, new_balance } => {
                assert_eq!(points, 1);
                assert_eq!(new_balance, 1);
            }
            other => panic!("expected award, got {other:?}"),
        }
        assert_eq!(account.checkin_streak, 1);
    }

    #[test]
    fn test_second_checkin_same_day_blocked_until_midnight() {
        // Scenario B: claim at 00:00:01, retry at 23:59:59 the same day.
        let mut account = account();
        let first = utc(2024, 3, 14, 0, 0, 1);
        claim_checkin(&mut account, first, 50.0, true);
        let balance = account.balance;

        let outcome = claim_checkin(&mut account, utc(2024, 3, 14, 23, 59, 59), 50.0, true);
        match outcome {
            ActionOutcome::Blocked {
                reason: BlockReason::AlreadyCheckedIn { retry_at },
            } => assert_eq!(retry_at, utc(2024, 3, 15, 0, 0, 0)),
            other => panic!("expected block, got {other:?}"),
        }
        assert_eq!(account.balance, balance);
    }

    #[test]
    fn test_streak_increments_on_consecutive_days() {
        let mut account = account();
        claim_checkin(&mut account, utc(2024, 3, 14, 9, 0, 0), 0.0, true);
        assert_eq!(account.checkin_streak, 1);

        claim_checkin(&mut account, utc(2024, 3, 15, 23, 0, 0), 0.0, true);
        assert_eq!(account.checkin_streak, 2);

        // A missed day resets to 1.
        claim_checkin(&mut account, utc(2024, 3, 18, 9, 0, 0), 0.0, true);
        assert_eq!(account.checkin_streak, 1);
    }

    #[test]
    fn test_streak_untouched_when_disabled() {
        let mut account = account();
        account.checkin_streak = 9;
        claim_checkin(&mut account, utc(2024, 3, 14, 9, 0, 0), 0.0, false);
        assert_eq!(account.checkin_streak, 9);
    }

    #[test]
    fn test_message_rewards_through_a_day() {
        // Scenario C: five messages 61s apart all award; the sixth hits the
        // daily limit; the next day's first message resets and awards.
        let mut account = account();
        let mut now = utc(2024, 3, 14, 10, 0, 0);
        for i in 0..DAILY_MESSAGE_REWARD_LIMIT {
            let outcome = award_message(
                &mut account,
                now,
                0.0,
                MESSAGE_REWARD_COOLDOWN_SECS,
                DAILY_MESSAGE_REWARD_LIMIT,
            );
            assert!(
                matches!(outcome, ActionOutcome::Awarded { .. }),
                "message {i} should award"
            );
            now += Duration::seconds(61);
        }
        assert_eq!(account.daily_reward_count, DAILY_MESSAGE_REWARD_LIMIT);

        let outcome = award_message(
            &mut account,
            now,
            0.0,
            MESSAGE_REWARD_COOLDOWN_SECS,
            DAILY_MESSAGE_REWARD_LIMIT,
        );
        assert!(matches!(
            outcome,
            ActionOutcome::Blocked {
                reason: BlockReason::DailyLimitReached { .. }
            }
        ));

        let next_day = utc(2024, 3, 15, 0, 30, 0);
        let outcome = award_message(
            &mut account,
            next_day,
            0.0,
            MESSAGE_REWARD_COOLDOWN_SECS,
            DAILY_MESSAGE_REWARD_LIMIT,
        );
        assert!(matches!(outcome, ActionOutcome::Awarded { .. }));
        assert_eq!(account.daily_reward_count, 1);
    }

    #[test]
    fn test_message_cooldown_blocks_with_retry_at() {
        let mut account = account();
        let first = utc(2024, 3, 14, 10, 0, 0);
        award_message(&mut account, first, 0.0, 60, DAILY_MESSAGE_REWARD_LIMIT);

        let outcome = award_message(
            &mut account,
            first + Duration::seconds(30),
            0.0,
            60,
            DAILY_MESSAGE_REWARD_LIMIT,
        );
        match outcome {
            ActionOutcome::Blocked {
                reason: BlockReason::OnCooldown { retry_at },
            } => assert_eq!(retry_at, first + Duration::seconds(60)),
            other => panic!("expected cooldown, got {other:?}"),
        }
        assert_eq!(account.daily_reward_count, 1);
    }

    #[test]
    fn test_first_message_not_on_cooldown() {
        let mut account = account();
        assert_eq!(account.last_reward_at, EPOCH);
        let outcome = award_message(
            &mut account,
            utc(2024, 3, 14, 10, 0, 0),
            0.0,
            60,
            DAILY_MESSAGE_REWARD_LIMIT,
        );
        assert!(matches!(outcome, ActionOutcome::Awarded { .. }));
    }

    #[test]
    fn test_lazy_reset_is_idempotent() {
        // P3: repeated access without a boundary crossing never resets
        // twice; one crossing resets exactly once regardless of call count.
        let mut account = account();
        let day_one = utc(2024, 3, 14, 10, 0, 0);
        award_message(&mut account, day_one, 0.0, 60, 5);
        award_message(&mut account, day_one + Duration::seconds(61), 0.0, 60, 5);
        assert_eq!(account.daily_reward_count, 2);

        let day_two = utc(2024, 3, 15, 8, 0, 0);
        award_message(&mut account, day_two, 0.0, 60, 5);
        assert_eq!(account.daily_reward_count, 1);
        let window_start = account.daily_window_started_at;

        // Later calls the same day must not reset again.
        award_message(&mut account, day_two + Duration::seconds(61), 0.0, 60, 5);
        assert_eq!(account.daily_reward_count, 2);
        assert_eq!(account.daily_window_started_at, window_start);
    }

    #[test]
    fn test_month_rollover_snapshots_once() {
        let mut account = account();
        account.balance = 40;

        assert!(roll_month(&mut account, utc(2024, 3, 14, 9, 0, 0)));
        assert_eq!(account.balance_at_month_start, 40);
        assert_eq!(monthly_earned(&account, utc(2024, 3, 14, 9, 0, 0)), 0);

        // Same month: no second snapshot.
        account.balance = 55;
        assert!(!roll_month(&mut account, utc(2024, 3, 28, 9, 0, 0)));
        assert_eq!(monthly_earned(&account, utc(2024, 3, 28, 9, 0, 0)), 15);

        // New month: earnings restart from the new snapshot.
        assert!(roll_month(&mut account, utc(2024, 4, 1, 0, 0, 5)));
        assert_eq!(account.balance_at_month_start, 55);
        assert_eq!(monthly_earned(&account, utc(2024, 4, 1, 0, 0, 5)), 0);
    }

    #[test]
    fn test_monthly_earned_zero_for_stale_snapshot() {
        // An account idle across the boundary must not leak last month's
        // earnings into the new month's view.
        let mut account = account();
        account.balance = 90;
        account.balance_at_month_start = 50;
        account.month_started_at = utc(2024, 3, 1, 0, 0, 0);

        assert_eq!(monthly_earned(&account, utc(2024, 3, 20, 0, 0, 0)), 40);
        assert_eq!(monthly_earned(&account, utc(2024, 4, 2, 0, 0, 0)), 0);
    }
}
