//! Time-window policy.
//!
//! Pure, deterministic calendar predicates over `(now, stored)` pairs. All
//! boundaries are UTC; the deployment's local time zone is not a product
//! concept. A stored epoch timestamp is the "never happened" sentinel and is
//! rejected before any date comparison, even though epoch's own UTC date is
//! a real calendar day.

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Utc};

use honor_types::account::EPOCH;

fn is_epoch(ts: DateTime<Utc>) -> bool {
    ts == EPOCH
}

/// True iff both timestamps fall on the same UTC calendar date. Epoch never
/// counts as any day.
pub fn is_same_utc_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    if is_epoch(a) || is_epoch(b) {
        return false;
    }
    a.date_naive() == b.date_naive()
}

/// True iff the stored window start no longer covers `now`, i.e. the lazy
/// daily reset is due. An epoch window start is always stale.
pub fn is_new_utc_day(now: DateTime<Utc>, window_start: DateTime<Utc>) -> bool {
    !is_same_utc_day(now, window_start)
}

/// True iff `now - last < seconds`. An epoch `last` means "no prior action"
/// and is never on cooldown, so the first-ever action always passes.
pub fn is_within_cooldown(now: DateTime<Utc>, last: DateTime<Utc>, seconds: i64) -> bool {
    if is_epoch(last) {
        return false;
    }
    now.signed_duration_since(last) < Duration::seconds(seconds)
}

/// Smallest timestamp strictly greater than `now` on a UTC-day boundary;
/// reported to callers as "come back at T".
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    (now.date_naive() + Days::new(1))
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// True iff both timestamps fall in the same UTC calendar month. Epoch never
/// counts as any month, so a fresh account always rolls its first snapshot.
pub fn is_same_utc_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    if is_epoch(a) || is_epoch(b) {
        return false;
    }
    a.year() == b.year() && a.month() == b.month()
}

/// Midnight on the first day of `now`'s UTC month.
pub fn start_of_utc_month(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// True iff `day` is exactly the UTC day before `now`'s day. Used by the
/// check-in streak. Epoch is never "yesterday".
pub fn is_previous_utc_day(now: DateTime<Utc>, day: DateTime<Utc>) -> bool {
    if is_epoch(day) {
        return false;
    }
    match now.date_naive().checked_sub_days(Days::new(1)) {
        Some(yesterday) => day.date_naive() == yesterday,
        None => false,
    }
}
