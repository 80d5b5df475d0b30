//! Run orchestration: config + data in, replay result out.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use spotlab_core::domain::{build_regime_map, Regime};
use spotlab_core::engine::{run_replay, ReplayData, ReplayProgress, ReplayResult};
use spotlab_core::signal::OversoldReversal;

use crate::config::{ConfigError, RunConfig};
use crate::data_loader::{load_symbol_bars, DataError};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result of one orchestrated run: the engine output plus the config echo
/// for the export layer.
#[derive(Debug)]
pub struct RunReport {
    pub config: RunConfig,
    pub result: ReplayResult,
}

/// Load every series, build the timeline and regime map, and replay.
///
/// The reference symbol's series is loaded regardless of whether it is also
/// traded; its classification drives the regime map for every step.
pub fn execute(
    config: &RunConfig,
    data_dir: &Path,
    progress: &mut dyn ReplayProgress,
) -> Result<RunReport, RunnerError> {
    config.validate()?;

    let reference = load_symbol_bars(data_dir, &config.reference_symbol)?;
    let regimes: HashMap<DateTime<Utc>, Regime> = build_regime_map(&reference);

    let mut series = Vec::with_capacity(config.symbols.len());
    for symbol in &config.symbols {
        let bars = if *symbol == config.reference_symbol {
            reference.clone()
        } else {
            load_symbol_bars(data_dir, symbol)?
        };
        series.push((symbol.clone(), bars));
    }

    let data = ReplayData::new(series);
    progress.report(
        0,
        &format!(
            "aligned {} series over {} steps",
            data.symbols().len(),
            data.timestamps().len()
        ),
    );
    let engine_config = config.engine_config();
    let result = run_replay(
        &data,
        &regimes,
        &OversoldReversal,
        &engine_config,
        progress,
    );

    Ok(RunReport {
        config: config.clone(),
        result,
    })
}
