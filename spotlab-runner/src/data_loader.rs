//! CSV bar loading.
//!
//! One file per symbol, named after the symbol with `/` replaced by `_`
//! (`SOL/USDT` reads `SOL_USDT.csv`). Indicator columns may be blank during
//! the warmup window; blanks load as NaN, the engine's missing-value marker.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use spotlab_core::domain::EnrichedBar;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data file for {symbol} (expected {path})")]
    MissingFile { symbol: String, path: String },
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: no rows")]
    Empty { path: String },
    #[error("{path} row {row}: {reason}")]
    BadRow {
        path: String,
        row: usize,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    rsi: Option<f64>,
    ema_slow: Option<f64>,
    atr: Option<f64>,
    band_lower: Option<f64>,
    band_upper: Option<f64>,
    channel_high: Option<f64>,
    channel_low: Option<f64>,
}

fn nan_if_missing(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Path of the bar file for `symbol` under `data_dir`.
pub fn symbol_file(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}.csv", symbol.replace('/', "_")))
}

/// Load one symbol's bar series, sorted by the caller's engine later.
/// Rows with unparseable prices fail the load; blanks in indicator columns
/// do not.
pub fn load_symbol_bars(data_dir: &Path, symbol: &str) -> Result<Vec<EnrichedBar>, DataError> {
    let path = symbol_file(data_dir, symbol);
    let display = path.display().to_string();
    if !path.exists() {
        return Err(DataError::MissingFile {
            symbol: symbol.to_string(),
            path: display,
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|source| DataError::Csv {
            path: display.clone(),
            source,
        })?;

    let mut bars = Vec::new();
    for (i, record) in reader.deserialize::<CsvRow>().enumerate() {
        let row = record.map_err(|source| DataError::Csv {
            path: display.clone(),
            source,
        })?;
        let bar = EnrichedBar {
            symbol: symbol.to_string(),
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            rsi: nan_if_missing(row.rsi),
            ema_slow: nan_if_missing(row.ema_slow),
            atr: nan_if_missing(row.atr),
            band_lower: nan_if_missing(row.band_lower),
            band_upper: nan_if_missing(row.band_upper),
            channel_high: nan_if_missing(row.channel_high),
            channel_low: nan_if_missing(row.channel_low),
        };
        if !bar.is_sane() {
            return Err(DataError::BadRow {
                path: display.clone(),
                row: i + 2, // 1-based, counting the header
                reason: format!(
                    "inconsistent OHLC (o={} h={} l={} c={})",
                    bar.open, bar.high, bar.low, bar.close
                ),
            });
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(DataError::Empty { path: display });
    }
    Ok(bars)
}
