/// Maximum display name length; longer names are truncated on import.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Cooldown between message rewards, in seconds.
pub const MESSAGE_REWARD_COOLDOWN_SECS: i64 = 60;

/// Message rewards per UTC day.
pub const DAILY_MESSAGE_REWARD_LIMIT: u32 = 5;

/// Wager plays per UTC day (shared by both rule variants).
pub const DAILY_WAGER_LIMIT: u32 = 5;

/// Coin flip stake bounds.
pub const WAGER_MIN_STAKE: u64 = 1;
pub const WAGER_MAX_STAKE: u64 = 5;

/// Lucky draw variant: fixed payout magnitudes and win probability.
pub const LUCKY_DRAW_WIN_AMOUNT: u64 = 5;
pub const LUCKY_DRAW_LOSS_AMOUNT: u64 = 5;
pub const LUCKY_DRAW_WIN_PERCENT: f64 = 60.0;
/// Minimum balance required to enter a lucky draw.
pub const LUCKY_DRAW_MIN_BALANCE: u64 = 5;

/// How long a wipe confirmation token stays valid, in seconds.
pub const WIPE_CONFIRM_EXPIRY_SECS: i64 = 30;

/// How long a processed event id is remembered for duplicate rejection,
/// in seconds. Eviction happens inline on insert; there is no sweeper.
pub const DEDUP_HORIZON_SECS: i64 = 600;

/// Hard cap on records accepted by a single import batch.
pub const MAX_IMPORT_RECORDS: usize = 100_000;
