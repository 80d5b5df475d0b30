//! Closed-trade records: the append-only ledger entry type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a position left the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Manual,
    Panic,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Manual => "manual",
            ExitReason::Panic => "panic",
        }
    }
}

/// One fully closed round trip. Partial exits do not produce a record; their
/// realized profit shows up in the balance and in `profit` when the remainder
/// closes the trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    /// Label of the signal that opened the trade.
    pub trigger: String,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    /// Gross capital committed at entry.
    pub invested: f64,
    /// Net realized profit for the whole round trip, fees included.
    pub profit: f64,
    pub profit_pct: f64,
    pub reason: ExitReason,
    /// Cash balance immediately after the exit settled.
    pub balance_after: f64,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn breakeven_trade_is_not_a_winner() {
        let trade = ClosedTrade {
            symbol: "ETH/USDT".into(),
            entry_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            entry_price: 100.0,
            trigger: "RSI Hook".into(),
            exit_time: Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap(),
            exit_price: 100.0,
            invested: 50.0,
            profit: 0.0,
            profit_pct: 0.0,
            reason: ExitReason::StopLoss,
            balance_after: 500.0,
        };
        assert!(!trade.is_winner());
    }

    #[test]
    fn exit_reason_labels() {
        assert_eq!(ExitReason::StopLoss.as_str(), "stop_loss");
        assert_eq!(ExitReason::Panic.as_str(), "panic");
    }
}
