//! SpotLab Core: single-position spot trading simulation and risk engine.
//!
//! This crate contains the heart of the engine:
//! - Domain types (enriched bars, regimes, positions, closed trades, account state)
//! - Regime classifier (reference-asset market sentinel)
//! - Risk governor (position sizing, daily circuit breaker, winter mode)
//! - Position lifecycle state machine (entry, partial exit, trailing stop, terminal exit)
//! - Two interchangeable drivers: chronological replay and tick-driven live
//! - Ledger-derived session statistics and a reproducibility fingerprint
//!
//! The entry-signal predicate is an opaque capability (`signal::EntrySignal`);
//! the engine is fully testable with a deterministic stub.

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod report;
pub mod risk;
pub mod signal;

pub use domain::{
    AccountState, AssetParams, AssetParamsTable, ClosedTrade, EnrichedBar, EquityPoint,
    ExitReason, Position, Regime, RegimeFallback,
};
pub use engine::{
    run_replay, EngineConfig, EngineError, EngineState, LiveTrader, ReplayData, ReplayResult,
    StatusReport, StepEvent, TickOutcome,
};
pub use report::SessionStats;
pub use risk::RiskConfig;
pub use signal::{EntrySignal, SignalDecision, SignalError};
