//! Run fingerprinting for reproducibility.
//!
//! Two runs with the same configuration and the same input timeline share a
//! fingerprint; any change to either produces a new one. Used to label
//! exported artifacts so results can be traced back to their inputs.

use blake3::Hasher;

use crate::engine::state::EngineConfig;
use crate::engine::timeline::ReplayData;

/// Hash the engine config plus the shape of the input timeline.
///
/// Bar contents are summarized by per-symbol counts and the timeline bounds
/// rather than hashed in full; a differing series of the same shape is
/// indistinguishable, which is an accepted tradeoff for large inputs.
pub fn run_fingerprint(config: &EngineConfig, data: &ReplayData) -> String {
    let mut hasher = Hasher::new();

    // Config serialization is deterministic for a given struct layout.
    if let Ok(bytes) = serde_json::to_vec(config) {
        hasher.update(&bytes);
    }

    for symbol in data.symbols() {
        hasher.update(symbol.as_bytes());
        hasher.update(&(data.bar_count(symbol) as u64).to_le_bytes());
    }
    if let (Some(first), Some(last)) = (data.timestamps().first(), data.timestamps().last()) {
        hasher.update(&first.timestamp().to_le_bytes());
        hasher.update(&last.timestamp().to_le_bytes());
    }
    hasher.update(&(data.timestamps().len() as u64).to_le_bytes());

    hasher.finalize().to_hex().to_string()
}
