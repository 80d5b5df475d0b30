//! Per-asset risk parameters with a default fallback.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Asset-specific tuning consumed by the signal predicate and the trailing
/// stop: oscillator buy threshold, stop distance in volatility units, and
/// take-profit distance in risk units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetParams {
    pub rsi_buy: f64,
    pub stop_atr_mult: f64,
    pub tp_risk_mult: f64,
}

impl Default for AssetParams {
    fn default() -> Self {
        Self {
            rsi_buy: 30.0,
            stop_atr_mult: 1.5,
            tp_risk_mult: 3.0,
        }
    }
}

/// Symbol-keyed parameter table; unknown symbols resolve to the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetParamsTable {
    default: AssetParams,
    overrides: HashMap<String, AssetParams>,
}

impl AssetParamsTable {
    pub fn new(default: AssetParams) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn insert(&mut self, symbol: impl Into<String>, params: AssetParams) {
        self.overrides.insert(symbol.into(), params);
    }

    pub fn get(&self, symbol: &str) -> AssetParams {
        self.overrides.get(symbol).copied().unwrap_or(self.default)
    }
}

impl Default for AssetParamsTable {
    /// Table seeded with the majors plus a high-volatility meme asset; every
    /// other symbol falls through to the default row.
    fn default() -> Self {
        let mut table = Self::new(AssetParams::default());
        table.insert(
            "BTC/USDT",
            AssetParams {
                rsi_buy: 33.0,
                stop_atr_mult: 1.3,
                tp_risk_mult: 2.5,
            },
        );
        table.insert(
            "ETH/USDT",
            AssetParams {
                rsi_buy: 33.0,
                stop_atr_mult: 1.4,
                tp_risk_mult: 2.8,
            },
        );
        table.insert(
            "BNB/USDT",
            AssetParams {
                rsi_buy: 32.0,
                stop_atr_mult: 1.4,
                tp_risk_mult: 2.8,
            },
        );
        table.insert(
            "SOL/USDT",
            AssetParams {
                rsi_buy: 30.0,
                stop_atr_mult: 1.5,
                tp_risk_mult: 3.0,
            },
        );
        table.insert(
            "PEPE/USDT",
            AssetParams {
                rsi_buy: 24.0,
                stop_atr_mult: 2.2,
                tp_risk_mult: 4.0,
            },
        );
        table
    }
}
