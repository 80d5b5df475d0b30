//! Regime classifier: a coarse market-condition label from a reference asset.
//!
//! The reference asset (a market-wide benchmark such as BTC) acts as a
//! sentinel: its oscillator and long-trend position gate or bias every entry
//! decision. Classification is a pure, total function of one enriched bar.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::EnrichedBar;

/// Oscillator level below which the reference asset is considered to be in a
/// capitulation move rather than an ordinary downtrend.
const CRASH_OSCILLATOR_THRESHOLD: f64 = 25.0;

/// Coarse market-regime label derived from the reference asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bull,
    Bear,
    Crash,
    /// Safe default when no reference data exists for a timestamp.
    Neutral,
}

impl Regime {
    pub fn is_crash(self) -> bool {
        matches!(self, Regime::Crash)
    }
}

/// Fallback used when the reference asset has no bar at the current timestamp.
///
/// One consistent default applies to both drivers; callers opt into the
/// permissive variant explicitly rather than inheriting a per-mode default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeFallback {
    /// Treat missing reference data as a downtrend (blocks trend-gated entries).
    Conservative,
    /// Treat missing reference data as neutral (entries are not trend-gated).
    Permissive,
}

impl RegimeFallback {
    pub fn regime(self) -> Regime {
        match self {
            RegimeFallback::Conservative => Regime::Bear,
            RegimeFallback::Permissive => Regime::Neutral,
        }
    }
}

impl Default for RegimeFallback {
    fn default() -> Self {
        RegimeFallback::Conservative
    }
}

/// Classify one reference bar. Priority order is fixed: extreme oversold
/// first, then trend position, then bull.
pub fn classify(reference: &EnrichedBar) -> Regime {
    if !reference.has_indicators() {
        return Regime::Neutral;
    }
    if reference.rsi < CRASH_OSCILLATOR_THRESHOLD {
        Regime::Crash
    } else if reference.close < reference.ema_slow {
        Regime::Bear
    } else {
        Regime::Bull
    }
}

/// Precompute the timestamp → regime map for a reference series.
///
/// The replay driver resolves the regime per step with O(1) lookups; missing
/// timestamps fall back per [`RegimeFallback`].
pub fn build_regime_map(reference: &[EnrichedBar]) -> HashMap<DateTime<Utc>, Regime> {
    reference
        .iter()
        .map(|bar| (bar.timestamp, classify(bar)))
        .collect()
}
