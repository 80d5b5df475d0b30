//! EnrichedBar: one time-indexed market observation with precomputed indicators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol at a single timestamp, enriched with the
/// indicator set the engine consumes.
///
/// Indicator columns are produced by an external enrichment collaborator and
/// are immutable once handed to the engine. Missing values are `NaN`; a bar
/// whose `rsi` or `ema_slow` is NaN is skipped for entry scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedBar {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Mean-reversion oscillator (RSI-14 in the reference pipeline).
    pub rsi: f64,
    /// Long-horizon trend average (EMA-200 in the reference pipeline).
    pub ema_slow: f64,
    /// Volatility unit (ATR-14 in the reference pipeline).
    pub atr: f64,
    /// Lower volatility band.
    pub band_lower: f64,
    /// Upper volatility band.
    pub band_upper: f64,
    /// Rolling high channel bound (50-bar).
    pub channel_high: f64,
    /// Rolling low channel bound (50-bar).
    pub channel_low: f64,
}

impl EnrichedBar {
    /// True when the indicators the scanner depends on are present.
    pub fn has_indicators(&self) -> bool {
        !self.rsi.is_nan() && !self.ema_slow.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, prices positive, range contains
    /// open and close.
    pub fn is_sane(&self) -> bool {
        if self.close.is_nan() || self.high.is_nan() || self.low.is_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Volatility unit with the fallback used when the enrichment pipeline has
    /// not produced an ATR yet: 1% of the close.
    pub fn volatility_unit(&self) -> f64 {
        if self.atr.is_nan() || self.atr <= 0.0 {
            self.close * 0.01
        } else {
            self.atr
        }
    }
}
