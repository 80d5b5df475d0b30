//! Position: the single open trade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one open spot position. At most one exists system-wide at any time;
/// the lifecycle state machine enforces that by construction.
///
/// `quantity` is post-fee (bought with the net invested amount); `invested`
/// keeps the gross capital committed so realized profit is net of both the
/// entry and exit fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub quantity: f64,
    /// Gross capital committed (before the entry fee).
    pub invested: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// First-risk-unit target fixed at entry: entry plus the distance to the
    /// initial stop. The trailing stop moving later must not shift it.
    pub partial_target: f64,
    pub partial_taken: bool,
    /// Profit already realized by the partial exit, net of fees.
    pub realized_profit: f64,
    /// Label of the signal that opened the trade.
    pub trigger: String,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Ratchet the stop upward. A lower candidate is ignored; the trailing
    /// stop never loosens.
    pub fn raise_stop(&mut self, candidate: f64) -> bool {
        if candidate > self.stop_loss {
            self.stop_loss = candidate;
            true
        } else {
            false
        }
    }
}
