//! Risk governor: the stateless policy layer over [`AccountState`].
//!
//! Every function takes the relevant clock as an argument; nothing in this
//! module reads wall time. Both drivers therefore make identical decisions
//! for identical inputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::AccountState;

/// Risk policy knobs. Defaults match the production paper-trading profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Taker fee applied on both sides of every fill.
    pub fee_rate: f64,
    /// Fraction of total equity committed per entry.
    pub risk_fraction: f64,
    /// Daily circuit breaker threshold, in percent (negative).
    pub daily_loss_limit_pct: f64,
    /// Exchange-style minimum order notional.
    pub min_notional: f64,
    /// Floor an undersized order up to this notional when cash allows.
    pub notional_floor: f64,
    /// Consecutive losses that arm winter mode.
    pub loss_streak_limit: u32,
    /// Winter-mode cooldown length, hours.
    pub winter_cooldown_hours: i64,
    /// Per-symbol re-entry cooldown after any exit, seconds.
    pub reentry_cooldown_secs: i64,
    /// Fill haircut applied to stop exits during a crash regime.
    pub crash_slippage: f64,
    /// Breakeven stop multiplier after a partial take-profit.
    pub breakeven_buffer: f64,
    /// Never commit more than this fraction of free cash.
    pub max_cash_fraction: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            fee_rate: 0.001,
            risk_fraction: 0.10,
            daily_loss_limit_pct: -3.0,
            min_notional: 10.0,
            notional_floor: 11.0,
            loss_streak_limit: 3,
            winter_cooldown_hours: 4,
            reentry_cooldown_secs: 300,
            crash_slippage: 0.998,
            breakeven_buffer: 1.002,
            max_cash_fraction: 0.98,
        }
    }
}

impl RiskConfig {
    pub fn winter_cooldown(&self) -> Duration {
        Duration::hours(self.winter_cooldown_hours)
    }

    pub fn reentry_cooldown(&self) -> Duration {
        Duration::seconds(self.reentry_cooldown_secs)
    }
}

/// Daily circuit breaker verdict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakerStatus {
    pub tripped: bool,
    /// Realized day change against the daily baseline, percent.
    pub day_pnl_pct: f64,
}

/// Reset the daily baseline when the UTC day of `now` has advanced past the
/// account's recorded day. Equity at rollover becomes the new baseline.
pub fn roll_day(account: &mut AccountState, now: DateTime<Utc>, equity: f64) -> bool {
    let today = now.date_naive();
    if today > account.current_day {
        account.current_day = today;
        account.daily_start_balance = equity;
        true
    } else {
        false
    }
}

/// Evaluate the daily circuit breaker against current equity.
///
/// The breaker blocks new entries only; it never forces an open position out.
pub fn circuit_breaker(config: &RiskConfig, account: &AccountState, equity: f64) -> BreakerStatus {
    if account.daily_start_balance <= 0.0 {
        return BreakerStatus {
            tripped: false,
            day_pnl_pct: 0.0,
        };
    }
    let day_pnl_pct = (equity - account.daily_start_balance) / account.daily_start_balance * 100.0;
    BreakerStatus {
        tripped: day_pnl_pct <= config.daily_loss_limit_pct,
        day_pnl_pct,
    }
}

/// True while winter mode holds entries shut.
pub fn in_winter(account: &AccountState, now: DateTime<Utc>) -> bool {
    matches!(account.cooldown_until, Some(until) if now < until)
}

/// Drop an expired winter cooldown so status reporting stays clean.
pub fn clear_expired_cooldown(account: &mut AccountState, now: DateTime<Utc>) {
    if matches!(account.cooldown_until, Some(until) if now >= until) {
        account.cooldown_until = None;
    }
}

/// True while the per-symbol re-entry cooldown still covers `symbol`.
pub fn in_reentry_cooldown(
    config: &RiskConfig,
    account: &AccountState,
    symbol: &str,
    now: DateTime<Utc>,
) -> bool {
    match &account.last_exit {
        Some(exit) if exit.symbol == symbol => now - exit.at < config.reentry_cooldown(),
        _ => false,
    }
}

/// Record a round-trip outcome for the loss-streak counter. Returns `true`
/// when this loss armed winter mode.
pub fn record_close(
    config: &RiskConfig,
    account: &mut AccountState,
    profit: f64,
    now: DateTime<Utc>,
) -> bool {
    if profit > 0.0 {
        account.consecutive_losses = 0;
        return false;
    }
    account.consecutive_losses += 1;
    if account.consecutive_losses >= config.loss_streak_limit {
        account.cooldown_until = Some(now + config.winter_cooldown());
        account.consecutive_losses = 0;
        true
    } else {
        false
    }
}

/// Size an entry from current equity and free cash.
///
/// Target is a fixed equity fraction, floored to a tradable notional when the
/// target is dust but cash allows, capped at a cash fraction so fees never
/// overdraw, and declined entirely below the exchange minimum.
pub fn position_size(config: &RiskConfig, equity: f64, cash: f64) -> Option<f64> {
    let mut target = equity * config.risk_fraction;
    if target < config.min_notional && cash >= config.notional_floor {
        target = config.notional_floor;
    }
    target = target.min(cash * config.max_cash_fraction);
    if target < config.min_notional {
        None
    } else {
        Some(target)
    }
}
