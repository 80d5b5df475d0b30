//! TOML run configuration.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use spotlab_core::domain::{AssetParams, AssetParamsTable, RegimeFallback};
use spotlab_core::engine::EngineConfig;
use spotlab_core::risk::RiskConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One replay run, as declared by the operator.
///
/// The `[risk]` table and `[params.<symbol>]` tables are optional; omitted
/// values fall back to the production defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub initial_balance: f64,
    /// Symbols to trade, in entry-scan priority order.
    pub symbols: Vec<String>,
    /// Reference asset driving the regime classifier.
    pub reference_symbol: String,
    #[serde(default)]
    pub ignore_trend: bool,
    #[serde(default)]
    pub regime_fallback: FallbackChoice,
    #[serde(default)]
    pub risk: RiskConfig,
    /// Per-symbol parameter overrides on top of the built-in table.
    #[serde(default)]
    pub params: HashMap<String, AssetParams>,
}

/// TOML-friendly spelling of [`RegimeFallback`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackChoice {
    #[default]
    Conservative,
    Permissive,
}

impl From<FallbackChoice> for RegimeFallback {
    fn from(choice: FallbackChoice) -> Self {
        match choice {
            FallbackChoice::Conservative => RegimeFallback::Conservative,
            FallbackChoice::Permissive => RegimeFallback::Permissive,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let config: RunConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_balance <= 0.0 {
            return Err(ConfigError::Invalid(
                "initial_balance must be positive".into(),
            ));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("symbols must not be empty".into()));
        }
        if self.reference_symbol.is_empty() {
            return Err(ConfigError::Invalid("reference_symbol is required".into()));
        }
        if !(0.0..1.0).contains(&self.risk.fee_rate) {
            return Err(ConfigError::Invalid("fee_rate must be in [0, 1)".into()));
        }
        if self.risk.risk_fraction <= 0.0 || self.risk.risk_fraction > 1.0 {
            return Err(ConfigError::Invalid(
                "risk_fraction must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }

    /// Lower into the engine's config, layering overrides onto the built-in
    /// parameter table.
    pub fn engine_config(&self) -> EngineConfig {
        let mut params = AssetParamsTable::default();
        for (symbol, p) in &self.params {
            params.insert(symbol.clone(), *p);
        }
        EngineConfig {
            initial_balance: self.initial_balance,
            risk: self.risk.clone(),
            params,
            ignore_trend: self.ignore_trend,
            regime_fallback: self.regime_fallback.into(),
        }
    }
}
