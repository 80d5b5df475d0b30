//! Position lifecycle state machine.
//!
//! One position at a time, four transitions: open, partial take-profit,
//! trailing-stop ratchet, terminal close. Both drivers call these functions;
//! neither reimplements any of the arithmetic.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{AssetParams, ClosedTrade, EnrichedBar, ExitReason, LastExit, Position, Regime};
use crate::risk::{self, RiskConfig};
use crate::signal::EntryMeta;

use super::state::EngineState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a position is already open")]
    PositionOpen,
    #[error("no open position")]
    NoPosition,
    #[error("insufficient balance: need {needed:.2}, have {available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },
    #[error("trading halted: {0}")]
    TradingHalted(String),
}

/// What a lifecycle step did to the book.
#[derive(Debug, Clone)]
pub enum StepEvent {
    Entered {
        symbol: String,
        price: f64,
        quantity: f64,
        stop_loss: f64,
        take_profit: f64,
    },
    PartialTaken {
        symbol: String,
        price: f64,
        realized: f64,
        new_stop: f64,
    },
    Closed(ClosedTrade),
}

/// Open a position committing `commit` gross cash at `price`.
///
/// The entry fee comes out of the commitment, so the acquired quantity is
/// bought with the net amount and the account parts with exactly `commit`.
pub fn open_position(
    risk: &RiskConfig,
    state: &mut EngineState,
    symbol: &str,
    price: f64,
    commit: f64,
    time: DateTime<Utc>,
    meta: &EntryMeta,
) -> Result<StepEvent, EngineError> {
    if state.position.is_some() {
        return Err(EngineError::PositionOpen);
    }
    if commit > state.account.balance {
        return Err(EngineError::InsufficientBalance {
            needed: commit,
            available: state.account.balance,
        });
    }

    let net_invested = commit * (1.0 - risk.fee_rate);
    let quantity = net_invested / price;
    state.account.balance -= commit;
    state.position = Some(Position {
        symbol: symbol.to_string(),
        entry_price: price,
        entry_time: time,
        quantity,
        invested: commit,
        stop_loss: meta.stop_loss,
        take_profit: meta.take_profit,
        partial_target: price + (price - meta.stop_loss),
        partial_taken: false,
        realized_profit: 0.0,
        trigger: meta.trigger.clone(),
    });

    Ok(StepEvent::Entered {
        symbol: symbol.to_string(),
        price,
        quantity,
        stop_loss: meta.stop_loss,
        take_profit: meta.take_profit,
    })
}

/// Close the open position at `price`, settle cash, update the loss streak
/// and re-entry cooldown, and append the round trip to the ledger.
pub fn close_position(
    risk: &RiskConfig,
    state: &mut EngineState,
    price: f64,
    time: DateTime<Utc>,
    reason: ExitReason,
) -> Result<ClosedTrade, EngineError> {
    let position = state.position.take().ok_or(EngineError::NoPosition)?;

    let gross = position.quantity * price;
    let net = gross * (1.0 - risk.fee_rate);
    state.account.balance += net;

    let remaining_basis = if position.partial_taken {
        position.invested * 0.5
    } else {
        position.invested
    };
    let final_profit = net - remaining_basis;
    let total_profit = position.realized_profit + final_profit;
    state.account.accumulated_pnl += final_profit;

    risk::record_close(risk, &mut state.account, total_profit, time);
    state.account.last_exit = Some(LastExit {
        symbol: position.symbol.clone(),
        at: time,
    });

    let trade = ClosedTrade {
        symbol: position.symbol,
        entry_time: position.entry_time,
        entry_price: position.entry_price,
        trigger: position.trigger,
        exit_time: time,
        exit_price: price,
        invested: position.invested,
        profit: total_profit,
        profit_pct: total_profit / position.invested * 100.0,
        reason,
        balance_after: state.account.balance,
    };
    state.ledger.push(trade.clone());
    Ok(trade)
}

/// Run the per-bar exit management for the open position against `bar`.
///
/// Check order: partial take-profit on the close, then the protective stop on
/// the low, then the target on the high, then the trailing-stop ratchet.
/// A stop fill during a crash regime takes the slippage haircut.
pub fn manage_open_position(
    risk: &RiskConfig,
    state: &mut EngineState,
    bar: &EnrichedBar,
    regime: Regime,
    params: &AssetParams,
) -> Result<Option<StepEvent>, EngineError> {
    {
        let position = state.position.as_ref().ok_or(EngineError::NoPosition)?;
        debug_assert_eq!(position.symbol, bar.symbol);
    }

    if let Some(event) = take_partial(risk, state, bar)? {
        return Ok(Some(event));
    }

    let position = state.position.as_ref().ok_or(EngineError::NoPosition)?;
    if bar.low <= position.stop_loss {
        let mut fill = position.stop_loss;
        if regime.is_crash() {
            fill *= risk.crash_slippage;
        }
        let trade = close_position(risk, state, fill, bar.timestamp, ExitReason::StopLoss)?;
        return Ok(Some(StepEvent::Closed(trade)));
    }

    if bar.high >= position.take_profit {
        let fill = position.take_profit;
        let trade = close_position(risk, state, fill, bar.timestamp, ExitReason::TakeProfit)?;
        return Ok(Some(StepEvent::Closed(trade)));
    }

    trail_stop(state, bar, params);
    Ok(None)
}

/// Sell half the position once the close reaches one risk unit above entry,
/// then move the stop to just above breakeven.
fn take_partial(
    risk: &RiskConfig,
    state: &mut EngineState,
    bar: &EnrichedBar,
) -> Result<Option<StepEvent>, EngineError> {
    let position = state.position.as_mut().ok_or(EngineError::NoPosition)?;
    if position.partial_taken || bar.close < position.partial_target {
        return Ok(None);
    }

    let sold = position.quantity * 0.5;
    let net = sold * bar.close * (1.0 - risk.fee_rate);
    let realized = net - position.invested * 0.5;

    position.quantity -= sold;
    position.partial_taken = true;
    position.realized_profit += realized;
    position.raise_stop(position.entry_price * risk.breakeven_buffer);
    let symbol = position.symbol.clone();
    let new_stop = position.stop_loss;

    state.account.balance += net;
    state.account.accumulated_pnl += realized;

    Ok(Some(StepEvent::PartialTaken {
        symbol,
        price: bar.close,
        realized,
        new_stop,
    }))
}

/// Ratchet the stop under a rising close. Only active once the close clears
/// entry by one volatility unit; the stop never moves down.
fn trail_stop(state: &mut EngineState, bar: &EnrichedBar, params: &AssetParams) {
    let Some(position) = state.position.as_mut() else {
        return;
    };
    let unit = bar.volatility_unit();
    if bar.close > position.entry_price + unit {
        position.raise_stop(bar.close - unit * params.stop_atr_mult);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{EngineConfig, EngineState};
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap()
    }

    fn bar(close: f64, low: f64, high: f64) -> EnrichedBar {
        EnrichedBar {
            symbol: "SOL/USDT".into(),
            timestamp: at(13),
            open: close,
            high,
            low,
            close,
            volume: 1_000.0,
            rsi: 40.0,
            ema_slow: close * 0.9,
            atr: 2.0,
            band_lower: close * 0.95,
            band_upper: close * 1.05,
            channel_high: close * 1.1,
            channel_low: close * 0.85,
        }
    }

    fn meta() -> EntryMeta {
        EntryMeta {
            stop_loss: 90.0,
            take_profit: 130.0,
            trigger: "RSI Hook".into(),
        }
    }

    fn opened_state() -> (RiskConfig, EngineState) {
        let config = EngineConfig::new(1000.0);
        let mut state = EngineState::new(&config, at(12));
        open_position(&config.risk, &mut state, "SOL/USDT", 100.0, 100.0, at(12), &meta()).unwrap();
        (config.risk, state)
    }

    #[test]
    fn open_deducts_gross_and_buys_net() {
        let (_, state) = opened_state();
        assert_eq!(state.account.balance, 900.0);
        let pos = state.position.as_ref().unwrap();
        assert!((pos.quantity - 0.999).abs() < 1e-12);
        assert_eq!(pos.invested, 100.0);
    }

    #[test]
    fn second_open_is_rejected() {
        let (risk, mut state) = opened_state();
        let err = open_position(&risk, &mut state, "ETH/USDT", 50.0, 50.0, at(13), &meta());
        assert!(matches!(err, Err(EngineError::PositionOpen)));
    }

    #[test]
    fn open_rejects_overdraft() {
        let config = EngineConfig::new(50.0);
        let mut state = EngineState::new(&config, at(12));
        let err = open_position(
            &config.risk,
            &mut state,
            "SOL/USDT",
            100.0,
            60.0,
            at(12),
            &meta(),
        );
        assert!(matches!(err, Err(EngineError::InsufficientBalance { .. })));
    }

    #[test]
    fn stop_fill_closes_at_stop_price() {
        let (risk, mut state) = opened_state();
        let event = manage_open_position(&risk, &mut state, &bar(91.0, 89.0, 95.0), Regime::Bull, &AssetParams::default())
            .unwrap()
            .unwrap();
        let StepEvent::Closed(trade) = event else {
            panic!("expected close");
        };
        assert_eq!(trade.exit_price, 90.0);
        assert_eq!(trade.reason, ExitReason::StopLoss);
        assert!(state.position.is_none());
        assert!(trade.profit < 0.0);
    }

    #[test]
    fn crash_stop_takes_slippage() {
        let (risk, mut state) = opened_state();
        let event = manage_open_position(&risk, &mut state, &bar(91.0, 89.0, 95.0), Regime::Crash, &AssetParams::default())
            .unwrap()
            .unwrap();
        let StepEvent::Closed(trade) = event else {
            panic!("expected close");
        };
        assert!((trade.exit_price - 90.0 * 0.998).abs() < 1e-12);
    }

    #[test]
    fn target_fill_closes_at_target_price() {
        let (risk, mut state) = opened_state();
        // Close stays under the 110 partial target; only the high crosses 130.
        let event = manage_open_position(&risk, &mut state, &bar(109.0, 105.0, 131.0), Regime::Bull, &AssetParams::default())
            .unwrap()
            .unwrap();
        let StepEvent::Closed(trade) = event else {
            panic!("expected close");
        };
        assert_eq!(trade.exit_price, 130.0);
        assert_eq!(trade.reason, ExitReason::TakeProfit);
        assert!(trade.is_winner());
    }

    #[test]
    fn partial_exit_sells_half_and_moves_stop_to_breakeven() {
        let (risk, mut state) = opened_state();
        // Risk unit is 10, so the partial target is 110.
        let event = manage_open_position(&risk, &mut state, &bar(110.0, 105.0, 111.0), Regime::Bull, &AssetParams::default())
            .unwrap()
            .unwrap();
        let StepEvent::PartialTaken {
            realized, new_stop, ..
        } = event
        else {
            panic!("expected partial");
        };
        let pos = state.position.as_ref().unwrap();
        assert!(pos.partial_taken);
        assert!((pos.quantity - 0.4995).abs() < 1e-12);
        assert!((new_stop - 100.2).abs() < 1e-12);
        // Sold 0.4995 at 110 net of fee, basis 50.
        let expected = 0.4995 * 110.0 * 0.999 - 50.0;
        assert!((realized - expected).abs() < 1e-9);
        assert!(realized > 0.0);

        // A second pass at the same price must not take another partial.
        let again =
            manage_open_position(&risk, &mut state, &bar(110.0, 105.0, 111.0), Regime::Bull, &AssetParams::default())
                .unwrap();
        assert!(again.is_none() || matches!(again, Some(StepEvent::Closed(_))));
    }

    #[test]
    fn round_trip_profit_includes_partial_leg() {
        let (risk, mut state) = opened_state();
        manage_open_position(&risk, &mut state, &bar(110.0, 105.0, 111.0), Regime::Bull, &AssetParams::default()).unwrap();
        let trade = close_position(&risk, &mut state, 120.0, at(15), ExitReason::Manual).unwrap();

        let partial = 0.4995 * 110.0 * 0.999 - 50.0;
        let final_leg = 0.4995 * 120.0 * 0.999 - 50.0;
        assert!((trade.profit - (partial + final_leg)).abs() < 1e-9);
        assert!((state.account.accumulated_pnl - trade.profit).abs() < 1e-9);
    }

    #[test]
    fn trailing_stop_ratchets_and_never_loosens() {
        let (risk, mut state) = opened_state();
        // close 104 > entry 100 + atr 2; candidate = 104 - 3 = 101
        manage_open_position(&risk, &mut state, &bar(104.0, 100.5, 105.0), Regime::Bull, &AssetParams::default()).unwrap();
        assert_eq!(state.position.as_ref().unwrap().stop_loss, 101.0);

        // Lower close: candidate 103 - 3 = 100 is below the current stop.
        // The bar's low of 101.5 stays above 101 so no stop fill either.
        manage_open_position(&risk, &mut state, &bar(103.0, 101.5, 104.0), Regime::Bull, &AssetParams::default()).unwrap();
        assert_eq!(state.position.as_ref().unwrap().stop_loss, 101.0);
    }

    #[test]
    fn flat_round_trip_costs_two_fees() {
        let (risk, mut state) = opened_state();
        let trade = close_position(&risk, &mut state, 100.0, at(14), ExitReason::Manual).unwrap();
        let expected = 100.0 * (-2.0 * risk.fee_rate + risk.fee_rate * risk.fee_rate);
        assert!((trade.profit - expected).abs() < 1e-9);
        assert!((state.account.balance - (1000.0 + expected)).abs() < 1e-9);
    }

    #[test]
    fn close_records_reentry_cooldown_source() {
        let (risk, mut state) = opened_state();
        close_position(&risk, &mut state, 100.0, at(14), ExitReason::Manual).unwrap();
        let exit = state.account.last_exit.as_ref().unwrap();
        assert_eq!(exit.symbol, "SOL/USDT");
        assert_eq!(exit.at, at(14));
    }
}
