//! Account state shared by both simulation drivers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Mutable portfolio accounting. Everything the risk governor needs to make
/// a gating decision lives here; the drivers own it and thread it through the
/// lifecycle functions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountState {
    /// Free cash, excluding capital locked in the open position.
    pub balance: f64,
    /// Running sum of realized profit since session start.
    pub accumulated_pnl: f64,
    /// Balance at the most recent UTC day rollover; the daily circuit
    /// breaker measures loss against it.
    pub daily_start_balance: f64,
    pub current_day: NaiveDate,
    /// High-water mark of total equity.
    pub peak_equity: f64,
    /// Consecutive losing round trips; resets on any winner.
    pub consecutive_losses: u32,
    /// Winter-mode expiry. While set and in the future, no entries.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Most recent exit, for the per-symbol re-entry cooldown.
    pub last_exit: Option<LastExit>,
}

/// Symbol and time of the last closed trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastExit {
    pub symbol: String,
    pub at: DateTime<Utc>,
}

/// One point on the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
}

impl AccountState {
    pub fn new(initial_balance: f64, now: DateTime<Utc>) -> Self {
        Self {
            balance: initial_balance,
            accumulated_pnl: 0.0,
            daily_start_balance: initial_balance,
            current_day: now.date_naive(),
            peak_equity: initial_balance,
            consecutive_losses: 0,
            cooldown_until: None,
            last_exit: None,
        }
    }

    /// Total equity given the mark value of whatever is on the book.
    pub fn equity(&self, position_value: f64) -> f64 {
        self.balance + position_value
    }

    pub fn update_peak(&mut self, equity: f64) {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
    }
}
