//! Replay timeline: the merged clock over every symbol's bar series.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::EnrichedBar;

/// Historical input for one replay run. Holds each symbol's bars in
/// chronological order plus a merged, deduplicated timestamp union and a
/// per-symbol timestamp index for O(1) bar lookup at every step.
#[derive(Debug, Clone)]
pub struct ReplayData {
    symbols: Vec<String>,
    series: HashMap<String, Vec<EnrichedBar>>,
    index: HashMap<String, HashMap<DateTime<Utc>, usize>>,
    timestamps: Vec<DateTime<Utc>>,
}

impl ReplayData {
    /// Build the timeline. Symbol order is preserved as given; it fixes the
    /// entry scan order, so the caller controls priority.
    pub fn new(series_by_symbol: Vec<(String, Vec<EnrichedBar>)>) -> Self {
        let mut symbols = Vec::with_capacity(series_by_symbol.len());
        let mut series = HashMap::new();
        let mut index: HashMap<String, HashMap<DateTime<Utc>, usize>> = HashMap::new();
        let mut timestamps: Vec<DateTime<Utc>> = Vec::new();

        for (symbol, mut bars) in series_by_symbol {
            bars.sort_by_key(|bar| bar.timestamp);
            let mut symbol_index = HashMap::with_capacity(bars.len());
            for (i, bar) in bars.iter().enumerate() {
                symbol_index.insert(bar.timestamp, i);
                timestamps.push(bar.timestamp);
            }
            symbols.push(symbol.clone());
            index.insert(symbol.clone(), symbol_index);
            series.insert(symbol, bars);
        }

        timestamps.sort();
        timestamps.dedup();

        Self {
            symbols,
            series,
            index,
            timestamps,
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The merged timestamp union, ascending and deduplicated.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn bar_count(&self, symbol: &str) -> usize {
        self.series.get(symbol).map_or(0, Vec::len)
    }

    /// Bar for `symbol` exactly at `ts`, if one exists.
    pub fn bar_at(&self, symbol: &str, ts: DateTime<Utc>) -> Option<&EnrichedBar> {
        let i = *self.index.get(symbol)?.get(&ts)?;
        self.series.get(symbol).and_then(|bars| bars.get(i))
    }

    /// Bar immediately preceding the one at `ts` in the same symbol's series.
    pub fn prev_bar_at(&self, symbol: &str, ts: DateTime<Utc>) -> Option<&EnrichedBar> {
        let i = *self.index.get(symbol)?.get(&ts)?;
        if i == 0 {
            None
        } else {
            self.series.get(symbol).and_then(|bars| bars.get(i - 1))
        }
    }
}
