//! Tick-driven live driver.
//!
//! Processes one enriched bar at a time through the same lifecycle and
//! risk-governor paths as the replay driver. All clocks derive from tick
//! timestamps, never wall time, so a recorded tick stream replayed through
//! `LiveTrader` reproduces the session decision for decision.

use chrono::{DateTime, Utc};

use crate::domain::{ClosedTrade, EnrichedBar, ExitReason, Position, Regime};
use crate::risk;
use crate::signal::{is_filtered_opportunity, EntryMeta, EntrySignal};

use super::lifecycle::{self, EngineError, StepEvent};
use super::state::{EngineConfig, EngineState};

/// What one tick did.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Daily circuit breaker is holding entries shut.
    Blocked(String),
    /// Winter-mode cooldown is active.
    WinterMode,
    /// Per-symbol re-entry cooldown covers this tick's symbol.
    CooldownActive,
    /// The signal saw the opportunity and filtered it.
    Filtered(String),
    /// The signal's collaborator failed; the tick was a no-op.
    SignalFailed(String),
    /// A lifecycle transition happened.
    Event(StepEvent),
    /// Nothing to do.
    Idle,
}

/// Operator-facing snapshot of the session.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub balance: f64,
    pub accumulated_pnl: f64,
    pub open_position: Option<Position>,
    /// Last 50 closed trades, newest first.
    pub recent_trades: Vec<ClosedTrade>,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
}

const RECENT_TRADES: usize = 50;

/// The live session. One instance per account; callers serialize access
/// (typically behind a mutex shared with the control surface).
#[derive(Debug, Clone)]
pub struct LiveTrader {
    config: EngineConfig,
    state: EngineState,
}

impl LiveTrader {
    pub fn new(config: EngineConfig, start: DateTime<Utc>) -> Self {
        let state = EngineState::new(&config, start);
        Self { config, state }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one tick. `prev` is the previous bar for the same symbol when
    /// the feed has one; `regime` is the caller's current reference-asset
    /// classification (or the configured fallback when the reference feed is
    /// stale).
    pub fn on_tick(
        &mut self,
        bar: &EnrichedBar,
        prev: Option<&EnrichedBar>,
        regime: Regime,
        signal: &dyn EntrySignal,
    ) -> TickOutcome {
        let now = bar.timestamp;
        let equity = self.equity_at(bar);
        risk::roll_day(&mut self.state.account, now, equity);
        risk::clear_expired_cooldown(&mut self.state.account, now);

        if let Some(position_symbol) = self.state.position.as_ref().map(|p| p.symbol.clone()) {
            if position_symbol == bar.symbol {
                let params = self.config.params.get(&position_symbol);
                if let Ok(Some(event)) = lifecycle::manage_open_position(
                    &self.config.risk,
                    &mut self.state,
                    bar,
                    regime,
                    &params,
                ) {
                    self.state.account.update_peak(self.equity_at(bar));
                    return TickOutcome::Event(event);
                }
            }
            self.state.account.update_peak(self.equity_at(bar));
            return TickOutcome::Idle;
        }

        if risk::in_winter(&self.state.account, now) {
            return TickOutcome::WinterMode;
        }

        let equity = self.equity_at(bar);
        self.state.account.update_peak(equity);

        let breaker = risk::circuit_breaker(&self.config.risk, &self.state.account, equity);
        if breaker.tripped {
            return TickOutcome::Blocked(format!(
                "daily loss limit reached ({:.2}%)",
                breaker.day_pnl_pct
            ));
        }

        if risk::in_reentry_cooldown(&self.config.risk, &self.state.account, &bar.symbol, now) {
            return TickOutcome::CooldownActive;
        }

        if !bar.has_indicators() {
            return TickOutcome::Idle;
        }

        let params = self.config.params.get(&bar.symbol);
        let decision =
            match signal.evaluate(bar, prev, &params, regime, self.config.ignore_trend) {
                Ok(decision) => decision,
                Err(err) => {
                    let line = format!("{} at {}: {}", bar.symbol, now, err);
                    self.state.signal_errors.push(line.clone());
                    return TickOutcome::SignalFailed(line);
                }
            };

        if decision.enter {
            let Some(meta) = decision.meta else {
                return TickOutcome::Idle;
            };
            let Some(commit) =
                risk::position_size(&self.config.risk, equity, self.state.account.balance)
            else {
                return TickOutcome::Idle;
            };
            return match lifecycle::open_position(
                &self.config.risk,
                &mut self.state,
                &bar.symbol,
                bar.close,
                commit,
                now,
                &meta,
            ) {
                Ok(event) => TickOutcome::Event(event),
                Err(err) => TickOutcome::Blocked(err.to_string()),
            };
        }

        if is_filtered_opportunity(&decision.reason) {
            self.state.ignored += 1;
            return TickOutcome::Filtered(decision.reason);
        }
        TickOutcome::Idle
    }

    /// Operator-initiated entry at `price`, bypassing the signal but not the
    /// risk governor's sizing. The stop is synthesized from a 2% volatility
    /// estimate when no enriched bar is at hand.
    pub fn manual_buy(
        &mut self,
        symbol: &str,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<StepEvent, EngineError> {
        if risk::in_winter(&self.state.account, now) {
            return Err(EngineError::TradingHalted("winter mode active".into()));
        }
        let params = self.config.params.get(symbol);
        let atr = price * 0.02;
        let stop_loss = price - atr * params.stop_atr_mult;
        let meta = EntryMeta {
            stop_loss,
            take_profit: price + (price - stop_loss) * params.tp_risk_mult,
            trigger: "MANUAL".into(),
        };
        let equity = self.state.equity_with(|_| None);
        let commit = risk::position_size(&self.config.risk, equity, self.state.account.balance)
            .ok_or(EngineError::InsufficientBalance {
                needed: self.config.risk.min_notional,
                available: self.state.account.balance,
            })?;
        lifecycle::open_position(
            &self.config.risk,
            &mut self.state,
            symbol,
            price,
            commit,
            now,
            &meta,
        )
    }

    /// Operator-initiated close at `price`.
    pub fn manual_close(
        &mut self,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<ClosedTrade, EngineError> {
        lifecycle::close_position(
            &self.config.risk,
            &mut self.state,
            price,
            now,
            ExitReason::Manual,
        )
    }

    /// Emergency flatten. Same settlement as a manual close, labelled so the
    /// ledger shows it was a panic.
    pub fn panic_close(
        &mut self,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<ClosedTrade, EngineError> {
        lifecycle::close_position(
            &self.config.risk,
            &mut self.state,
            price,
            now,
            ExitReason::Panic,
        )
    }

    pub fn status(&self) -> StatusReport {
        let wins = self.state.ledger.iter().filter(|t| t.is_winner()).count();
        let total = self.state.ledger.len();
        let losses = total - wins;
        let win_rate_pct = if total == 0 {
            0.0
        } else {
            wins as f64 / total as f64 * 100.0
        };
        let recent_trades = self
            .state
            .ledger
            .iter()
            .rev()
            .take(RECENT_TRADES)
            .cloned()
            .collect();
        StatusReport {
            balance: self.state.account.balance,
            accumulated_pnl: self.state.account.accumulated_pnl,
            open_position: self.state.position.clone(),
            recent_trades,
            wins,
            losses,
            win_rate_pct,
        }
    }

    /// Discard all session state and start over with a fresh balance. The
    /// open position, ledger and cooldowns are gone; config stays.
    pub fn reset(&mut self, new_balance: f64, now: DateTime<Utc>) {
        let mut config = self.config.clone();
        config.initial_balance = new_balance;
        self.state = EngineState::new(&config, now);
        self.config = config;
    }

    fn equity_at(&self, bar: &EnrichedBar) -> f64 {
        self.state.equity_with(|symbol| {
            if symbol == bar.symbol {
                Some(bar.close)
            } else {
                None
            }
        })
    }
}
