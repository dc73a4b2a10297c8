//! Wager state machine.
//!
//! One engine, two rule configurations: the double-or-nothing coin flip
//! (stake-proportional payout) and the fixed-odds lucky draw (fixed win and
//! loss magnitudes with an asymmetric win probability). Rejections are
//! checked in a fixed order: stake bounds, balance, daily quota. The daily
//! counter and timestamp advance on every resolved play, win or lose.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use honor_types::{
    ActionOutcome, BlockReason, CoinSide, UserAccount, LUCKY_DRAW_LOSS_AMOUNT,
    LUCKY_DRAW_MIN_BALANCE, LUCKY_DRAW_WIN_AMOUNT, LUCKY_DRAW_WIN_PERCENT, WAGER_MAX_STAKE,
    WAGER_MIN_STAKE,
};

use crate::rewards;
use crate::window;

/// Rule configuration for the wager engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WagerRules {
    /// Coin flip: call a side, stake within bounds, win pays `+stake`,
    /// loss costs `-stake`.
    DoubleOrNothing { min_stake: u64, max_stake: u64 },
    /// Lucky draw: stake and call are ignored; a fixed amount is won or
    /// lost at a configured probability, gated on a minimum balance.
    FixedOdds {
        win_percent: f64,
        win_amount: u64,
        loss_amount: u64,
        min_balance: u64,
    },
}

impl WagerRules {
    pub fn coin_flip() -> Self {
        Self::DoubleOrNothing {
            min_stake: WAGER_MIN_STAKE,
            max_stake: WAGER_MAX_STAKE,
        }
    }

    pub fn lucky_draw() -> Self {
        Self::FixedOdds {
            win_percent: LUCKY_DRAW_WIN_PERCENT,
            win_amount: LUCKY_DRAW_WIN_AMOUNT,
            loss_amount: LUCKY_DRAW_LOSS_AMOUNT,
            min_balance: LUCKY_DRAW_MIN_BALANCE,
        }
    }
}

impl Default for WagerRules {
    fn default() -> Self {
        Self::coin_flip()
    }
}

/// Resolve one wager against the account.
///
/// `roll` is one uniform `[0, 100)` sample; it decides the coin side or the
/// fixed-odds outcome depending on the rules.
pub fn place_wager(
    account: &mut UserAccount,
    rules: &WagerRules,
    stake: u64,
    choice: CoinSide,
    now: DateTime<Utc>,
    roll: f64,
    daily_limit: u32,
) -> ActionOutcome {
    match rules {
        WagerRules::DoubleOrNothing { min_stake, max_stake } => {
            if stake < *min_stake || stake > *max_stake {
                return ActionOutcome::Blocked {
                    reason: BlockReason::StakeOutOfBounds {
                        min: *min_stake,
                        max: *max_stake,
                    },
                };
            }
            if account.balance < stake {
                return ActionOutcome::Blocked {
                    reason: BlockReason::InsufficientBalance {
                        balance: account.balance,
                        required: stake,
                    },
                };
            }
        }
        WagerRules::FixedOdds { min_balance, .. } => {
            if account.balance < *min_balance {
                return ActionOutcome::Blocked {
                    reason: BlockReason::InsufficientBalance {
                        balance: account.balance,
                        required: *min_balance,
                    },
                };
            }
        }
    }

    // Lazy quota reset, anchored on the last play.
    if window::is_new_utc_day(now, account.last_wager_at) {
        account.daily_wager_count = 0;
    }
    if account.daily_wager_count >= daily_limit {
        return ActionOutcome::Blocked {
            reason: BlockReason::WagerLimitReached {
                retry_at: window::next_utc_midnight(now),
            },
        };
    }

    let (won, delta, drawn) = match rules {
        WagerRules::DoubleOrNothing { .. } => {
            let drawn = rewards::coin_side(roll);
            let won = drawn == choice;
            let delta = if won { stake as i64 } else { -(stake as i64) };
            (won, delta, Some(drawn))
        }
        WagerRules::FixedOdds {
            win_percent,
            win_amount,
            loss_amount,
            ..
        } => {
            let won = rewards::fixed_odds_win(roll, *win_percent);
            let delta = if won {
                *win_amount as i64
            } else {
                -(*loss_amount as i64)
            };
            (won, delta, None)
        }
    };

    if delta >= 0 {
        account.balance = account.balance.saturating_add(delta as u64);
    } else {
        // Losses clamp at zero; the nominal delta is still reported.
        account.balance = account.balance.saturating_sub(delta.unsigned_abs());
    }
    account.daily_wager_count += 1;
    account.last_wager_at = now;

    ActionOutcome::WagerResolved {
        won,
        delta,
        new_balance: account.balance,
        drawn,
        plays_today: account.daily_wager_count,
    }
}
