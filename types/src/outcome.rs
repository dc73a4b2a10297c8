use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coin flip call (and result) for the double-or-nothing wager variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSide {
    Heads,
    Tails,
}

/// Why an action was blocked. Blocks are normal terminal states of the
/// state machine, not errors; each carries enough context for the caller
/// to tell the user what rule was hit and when it resets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    AlreadyCheckedIn { retry_at: DateTime<Utc> },
    OnCooldown { retry_at: DateTime<Utc> },
    DailyLimitReached { retry_at: DateTime<Utc> },
    StakeOutOfBounds { min: u64, max: u64 },
    InsufficientBalance { balance: u64, required: u64 },
    WagerLimitReached { retry_at: DateTime<Utc> },
    /// The same event identifier was already processed within the dedup
    /// horizon.
    DuplicateEvent,
}

/// Result of an engine call, for the caller to render. The engine never
/// formats user-facing text. Persistence failures are not outcomes; they
/// surface as errors on the call itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActionOutcome {
    Awarded {
        points: u64,
        new_balance: u64,
    },
    Blocked {
        reason: BlockReason,
    },
    WagerResolved {
        won: bool,
        /// Nominal signed balance change; the applied change may be smaller
        /// when a loss clamps at zero.
        delta: i64,
        new_balance: u64,
        /// Side the coin landed on (double-or-nothing variant only).
        drawn: Option<CoinSide>,
        plays_today: u32,
    },
}

impl ActionOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ActionOutcome::Blocked { .. })
    }
}
