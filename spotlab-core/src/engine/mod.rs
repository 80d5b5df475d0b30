//! Simulation drivers and the shared position lifecycle.
//!
//! Two drivers consume the same lifecycle and risk-governor code paths:
//! [`run_replay`] walks a historical timeline chronologically, and
//! [`LiveTrader`] processes one tick at a time. Identical inputs through
//! either driver produce identical decisions.

pub mod lifecycle;
pub mod live;
pub mod progress;
pub mod replay;
pub mod state;
pub mod timeline;

pub use lifecycle::{EngineError, StepEvent};
pub use live::{LiveTrader, StatusReport, TickOutcome};
pub use progress::{NullProgress, ReplayProgress, StdoutProgress};
pub use replay::{run_replay, ReplayResult};
pub use state::{EngineConfig, EngineState};
pub use timeline::ReplayData;
