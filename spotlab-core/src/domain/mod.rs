//! Domain types for the spot trading engine.

pub mod account;
pub mod bar;
pub mod params;
pub mod position;
pub mod regime;
pub mod trade;

pub use account::{AccountState, EquityPoint, LastExit};
pub use bar::EnrichedBar;
pub use params::{AssetParams, AssetParamsTable};
pub use position::Position;
pub use regime::{build_regime_map, classify, Regime, RegimeFallback};
pub use trade::{ClosedTrade, ExitReason};
