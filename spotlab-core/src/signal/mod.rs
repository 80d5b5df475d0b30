//! Entry-signal predicate seam.
//!
//! The engine never hardcodes a strategy: every entry decision goes through
//! [`EntrySignal`], an opaque capability. Implementations see market data and
//! parameters only, never account state, the ledger, or risk-governor
//! internals. That keeps the drivers testable with deterministic stubs.

pub mod oversold;

use thiserror::Error;

use crate::domain::{AssetParams, EnrichedBar, Regime};

pub use oversold::OversoldReversal;

/// A collaborator (data lookup, indicator pipeline, model call) failed while
/// producing a verdict. The engine treats the step as a no-op.
#[derive(Debug, Error)]
#[error("signal evaluation failed: {0}")]
pub struct SignalError(pub String);

/// Stop and target prices the signal proposes for an entry, plus a label for
/// the ledger.
#[derive(Debug, Clone)]
pub struct EntryMeta {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trigger: String,
}

/// Verdict for one (symbol, timestamp) opportunity.
#[derive(Debug, Clone)]
pub struct SignalDecision {
    pub enter: bool,
    /// Human-readable reason, kept for the ignored-opportunity tally.
    pub reason: String,
    /// Present iff `enter` is true.
    pub meta: Option<EntryMeta>,
}

impl SignalDecision {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            enter: false,
            reason: reason.into(),
            meta: None,
        }
    }

    pub fn enter(meta: EntryMeta) -> Self {
        Self {
            enter: true,
            reason: format!("enter: {}", meta.trigger),
            meta: Some(meta),
        }
    }
}

/// The entry-signal predicate. `prev` is the previous bar for the same symbol
/// when one exists; `ignore_trend` lifts the long-trend gate (a deliberate
/// operator override, not a data condition).
pub trait EntrySignal: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        bar: &EnrichedBar,
        prev: Option<&EnrichedBar>,
        params: &AssetParams,
        regime: Regime,
        ignore_trend: bool,
    ) -> Result<SignalDecision, SignalError>;
}

/// True when a pass verdict represents a filtered opportunity (a condition the
/// engine chose to skip) rather than a plain absence of signal. Only filtered
/// opportunities feed the ignored tally.
pub fn is_filtered_opportunity(reason: &str) -> bool {
    reason.contains("BLOCKED") || reason.contains("FALLING")
}

/// Signal that never fires. Useful for exercising exit logic in isolation.
#[derive(Debug, Default)]
pub struct NullSignal;

impl EntrySignal for NullSignal {
    fn name(&self) -> &str {
        "null"
    }

    fn evaluate(
        &self,
        _bar: &EnrichedBar,
        _prev: Option<&EnrichedBar>,
        _params: &AssetParams,
        _regime: Regime,
        _ignore_trend: bool,
    ) -> Result<SignalDecision, SignalError> {
        Ok(SignalDecision::pass("no signal"))
    }
}
