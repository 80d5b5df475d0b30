//! Engine configuration and mutable run state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AccountState, AssetParamsTable, ClosedTrade, EquityPoint, Position, RegimeFallback,
};
use crate::risk::RiskConfig;

/// Everything the engine needs to run, fixed for the whole session. The
/// serialized form feeds the run fingerprint, so field order matters for
/// reproducibility across builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_balance: f64,
    pub risk: RiskConfig,
    pub params: AssetParamsTable,
    /// Operator override: lift the long-trend entry gate.
    pub ignore_trend: bool,
    /// Regime used when the reference asset has no bar at a timestamp.
    pub regime_fallback: RegimeFallback,
}

impl EngineConfig {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            initial_balance,
            risk: RiskConfig::default(),
            params: AssetParamsTable::default(),
            ignore_trend: false,
            regime_fallback: RegimeFallback::default(),
        }
    }
}

/// Mutable state threaded through the lifecycle functions. Both drivers own
/// exactly one of these for the duration of a session.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub account: AccountState,
    pub position: Option<Position>,
    /// Append-only ledger of fully closed round trips.
    pub ledger: Vec<ClosedTrade>,
    /// Replay-only equity curve; live mode leaves it empty.
    pub equity_curve: Vec<EquityPoint>,
    /// Opportunities the engine saw and deliberately filtered.
    pub ignored: usize,
    /// Collaborator failures surfaced by the signal, newest last.
    pub signal_errors: Vec<String>,
}

impl EngineState {
    pub fn new(config: &EngineConfig, start: DateTime<Utc>) -> Self {
        Self {
            account: AccountState::new(config.initial_balance, start),
            position: None,
            ledger: Vec::new(),
            equity_curve: Vec::new(),
            ignored: 0,
            signal_errors: Vec::new(),
        }
    }

    /// Total equity marking the open position (if any) at `price_of` per
    /// symbol. Callers pass a closure so each driver supplies its own notion
    /// of the current price.
    pub fn equity_with(&self, price_of: impl Fn(&str) -> Option<f64>) -> f64 {
        let position_value = self
            .position
            .as_ref()
            .map(|pos| {
                let price = price_of(&pos.symbol).unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .unwrap_or(0.0);
        self.account.equity(position_value)
    }
}
