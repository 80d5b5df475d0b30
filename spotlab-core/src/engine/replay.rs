//! Chronological replay driver.
//!
//! Walks the merged timestamp union of every symbol's series, applying exit
//! management before entry scanning at each step. All clocks are bar
//! timestamps; the driver never reads wall time, so a rerun over the same
//! inputs is bit-identical.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{ClosedTrade, EquityPoint, Regime};
use crate::fingerprint;
use crate::report::SessionStats;
use crate::risk;
use crate::signal::{is_filtered_opportunity, EntrySignal};

use super::lifecycle::{self, StepEvent};
use super::progress::ReplayProgress;
use super::state::{EngineConfig, EngineState};
use super::timeline::ReplayData;

/// Everything a replay run produces.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub stats: SessionStats,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Opportunities filtered by regime or momentum gates.
    pub ignored: usize,
    /// Signal collaborator failures, one line per abandoned step.
    pub signal_errors: Vec<String>,
    /// Content hash of config and inputs for run identification.
    pub fingerprint: String,
}

/// Run one full replay over `data`.
///
/// `regimes` maps reference-asset timestamps to regime labels; gaps fall back
/// per `config.regime_fallback`. The entry scan visits symbols in
/// `data.symbols()` order and the first firing signal wins the step.
pub fn run_replay(
    data: &ReplayData,
    regimes: &HashMap<DateTime<Utc>, Regime>,
    signal: &dyn EntrySignal,
    config: &EngineConfig,
    progress: &mut dyn ReplayProgress,
) -> ReplayResult {
    let fingerprint = fingerprint::run_fingerprint(config, data);
    let timestamps = data.timestamps();
    let start = timestamps
        .first()
        .copied()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let mut state = EngineState::new(config, start);

    // Marks for equity when a symbol has no bar at the current step.
    let mut last_close: HashMap<String, f64> = HashMap::new();
    let total = timestamps.len();
    let mut last_percent = 0u8;

    for (step, &ts) in timestamps.iter().enumerate() {
        for symbol in data.symbols() {
            if let Some(bar) = data.bar_at(symbol, ts) {
                last_close.insert(symbol.clone(), bar.close);
            }
        }

        let equity = state.equity_with(|symbol| last_close.get(symbol).copied());
        risk::roll_day(&mut state.account, ts, equity);
        risk::clear_expired_cooldown(&mut state.account, ts);

        if risk::in_winter(&state.account, ts) {
            state.equity_curve.push(EquityPoint {
                timestamp: ts,
                equity,
            });
            continue;
        }

        let regime = regimes
            .get(&ts)
            .copied()
            .unwrap_or_else(|| config.regime_fallback.regime());

        if let Some(position_symbol) = state.position.as_ref().map(|p| p.symbol.clone()) {
            if let Some(bar) = data.bar_at(&position_symbol, ts) {
                let bar = bar.clone();
                let params = config.params.get(&position_symbol);
                // Position exists and the symbol matches, so this cannot fail.
                let _ = lifecycle::manage_open_position(
                    &config.risk,
                    &mut state,
                    &bar,
                    regime,
                    &params,
                );
            }
        }

        let equity = state.equity_with(|symbol| last_close.get(symbol).copied());

        // Winter can arm mid-step (a third loss during exit management), so
        // the gate rechecks it before scanning.
        if state.position.is_none() && !risk::in_winter(&state.account, ts) {
            let breaker = risk::circuit_breaker(&config.risk, &state.account, equity);
            if !breaker.tripped {
                scan_for_entry(data, ts, regime, signal, config, &mut state, equity);
            }
        }

        state.account.update_peak(equity);
        state.equity_curve.push(EquityPoint {
            timestamp: ts,
            equity,
        });

        let percent = ((step + 1) * 100 / total) as u8;
        if percent > last_percent {
            last_percent = percent;
            progress.report(percent, &format!("replayed {} of {} steps", step + 1, total));
        }
    }

    let stats = SessionStats::compute(
        config.initial_balance,
        &state.ledger,
        &state.equity_curve,
        state.ignored,
    );
    ReplayResult {
        stats,
        trades: state.ledger,
        equity_curve: state.equity_curve,
        ignored: state.ignored,
        signal_errors: state.signal_errors,
        fingerprint,
    }
}

/// Scan symbols in priority order; the first firing signal takes the step.
/// A signal error abandons the whole scan for this timestamp.
fn scan_for_entry(
    data: &ReplayData,
    ts: DateTime<Utc>,
    regime: Regime,
    signal: &dyn EntrySignal,
    config: &EngineConfig,
    state: &mut EngineState,
    equity: f64,
) {
    for symbol in data.symbols() {
        let Some(bar) = data.bar_at(symbol, ts) else {
            continue;
        };
        if !bar.has_indicators() {
            continue;
        }
        if risk::in_reentry_cooldown(&config.risk, &state.account, symbol, ts) {
            continue;
        }

        let prev = data.prev_bar_at(symbol, ts);
        let params = config.params.get(symbol);
        let decision = match signal.evaluate(bar, prev, &params, regime, config.ignore_trend) {
            Ok(decision) => decision,
            Err(err) => {
                state
                    .signal_errors
                    .push(format!("{} at {}: {}", symbol, ts, err));
                return;
            }
        };

        if decision.enter {
            let Some(meta) = decision.meta else {
                continue;
            };
            let Some(commit) = risk::position_size(&config.risk, equity, state.account.balance)
            else {
                continue;
            };
            if let Ok(StepEvent::Entered { .. }) = lifecycle::open_position(
                &config.risk,
                state,
                symbol,
                bar.close,
                commit,
                ts,
                &meta,
            ) {
                return;
            }
        } else if is_filtered_opportunity(&decision.reason) {
            state.ignored += 1;
        }
    }
}
