//! Session statistics derived from the ledger and equity curve.
//!
//! Pure functions of their inputs: computing stats twice over the same run
//! gives identical results, and nothing here mutates engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ClosedTrade, EquityPoint};

/// Aggregate result of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub profit_total: f64,
    pub roi_pct: f64,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    /// Worst peak-to-trough equity drop, percent (zero or negative).
    pub max_drawdown_pct: f64,
    /// Opportunities seen and deliberately filtered.
    pub ignored_opportunities: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Human-readable session length, e.g. "12d 4h".
    pub duration: String,
}

impl SessionStats {
    pub fn compute(
        initial_balance: f64,
        trades: &[ClosedTrade],
        equity_curve: &[EquityPoint],
        ignored: usize,
    ) -> Self {
        let final_balance = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_balance);
        let profit_total = final_balance - initial_balance;
        let roi_pct = if initial_balance > 0.0 {
            profit_total / initial_balance * 100.0
        } else {
            0.0
        };

        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let losses = trades.len() - wins;
        let win_rate_pct = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64 * 100.0
        };

        let start = equity_curve.first().map(|p| p.timestamp);
        let end = equity_curve.last().map(|p| p.timestamp);
        let duration = match (start, end) {
            (Some(s), Some(e)) => {
                let d = e - s;
                format!("{}d {}h", d.num_days(), d.num_hours() % 24)
            }
            _ => "0d 0h".into(),
        };

        Self {
            initial_balance,
            final_balance,
            profit_total,
            roi_pct,
            total_trades: trades.len(),
            wins,
            losses,
            win_rate_pct,
            max_drawdown_pct: max_drawdown(equity_curve),
            ignored_opportunities: ignored,
            start,
            end,
            duration,
        }
    }
}

/// Worst peak-to-trough drop over the curve, as a non-positive percentage.
fn max_drawdown(curve: &[EquityPoint]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (point.equity - peak) / peak * 100.0;
            if dd < worst {
                worst = dd;
            }
        }
    }
    worst
}
