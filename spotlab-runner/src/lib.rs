//! SpotLab Runner: run orchestration around `spotlab-core`.
//!
//! Loads a TOML run configuration and per-symbol CSV bar files, assembles the
//! replay timeline and regime map, runs the engine and exports the resulting
//! artifacts (stats, ledger, equity curve) to disk.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, RunConfig};
pub use data_loader::{load_symbol_bars, DataError};
pub use export::{export_run, ExportError};
pub use runner::{execute, RunReport, RunnerError};
