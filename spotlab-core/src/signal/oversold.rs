//! Oversold-reversal entry signal (the production default).
//!
//! Fires on an oscillator hook: RSI below the per-asset buy threshold and
//! turning up from the previous bar, with the close at or near the lower
//! volatility band. Regime gates run first.

use crate::domain::{AssetParams, EnrichedBar, Regime};

use super::{EntryMeta, EntrySignal, SignalDecision, SignalError};

/// Tolerance for the lower-band confluence check: close within 1% above the
/// band still counts as a touch.
const BAND_TOUCH_TOLERANCE: f64 = 1.01;

/// Oscillator value assumed for the previous bar when no history exists yet.
/// Sits above every buy threshold, so the first bar of a series reads as
/// still falling and can never register a hook on its own.
const NEUTRAL_PREV_RSI: f64 = 50.0;

#[derive(Debug, Default)]
pub struct OversoldReversal;

impl EntrySignal for OversoldReversal {
    fn name(&self) -> &str {
        "oversold_reversal"
    }

    fn evaluate(
        &self,
        bar: &EnrichedBar,
        prev: Option<&EnrichedBar>,
        params: &AssetParams,
        regime: Regime,
        ignore_trend: bool,
    ) -> Result<SignalDecision, SignalError> {
        if regime.is_crash() {
            return Ok(SignalDecision::pass("BLOCKED: crash regime"));
        }
        if regime == Regime::Bear && !ignore_trend {
            return Ok(SignalDecision::pass("BLOCKED: below long trend"));
        }
        if !bar.has_indicators() {
            return Ok(SignalDecision::pass("indicators warming up"));
        }

        if bar.rsi >= params.rsi_buy {
            return Ok(SignalDecision::pass("oscillator not oversold"));
        }

        let prev_rsi = prev
            .filter(|p| !p.rsi.is_nan())
            .map(|p| p.rsi)
            .unwrap_or(NEUTRAL_PREV_RSI);
        if bar.rsi <= prev_rsi {
            return Ok(SignalDecision::pass("FALLING: oscillator still dropping"));
        }

        if !bar.band_lower.is_nan() && bar.close > bar.band_lower * BAND_TOUCH_TOLERANCE {
            return Ok(SignalDecision::pass("no lower-band confluence"));
        }

        let stop_loss = bar.close - bar.volatility_unit() * params.stop_atr_mult;
        if stop_loss <= 0.0 {
            return Err(SignalError(format!(
                "degenerate stop for {} at {} (close {}, atr {})",
                bar.symbol, bar.timestamp, bar.close, bar.atr
            )));
        }
        let take_profit = bar.close + (bar.close - stop_loss) * params.tp_risk_mult;

        Ok(SignalDecision::enter(EntryMeta {
            stop_loss,
            take_profit,
            trigger: "RSI Hook".into(),
        }))
    }
}
