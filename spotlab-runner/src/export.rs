//! Artifact export: stats.json, trades.json and equity.csv per run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::runner::RunReport;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write equity curve: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct StatsDocument<'a> {
    fingerprint: &'a str,
    config: &'a crate::config::RunConfig,
    stats: &'a spotlab_core::report::SessionStats,
    signal_errors: &'a [String],
}

/// Write the run's artifacts into `out_dir`, creating it if needed.
/// Returns the paths written, stats first.
pub fn export_run(report: &RunReport, out_dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.display().to_string(),
        source,
    })?;

    let stats_path = out_dir.join("stats.json");
    let document = StatsDocument {
        fingerprint: &report.result.fingerprint,
        config: &report.config,
        stats: &report.result.stats,
        signal_errors: &report.result.signal_errors,
    };
    write_json(&stats_path, &document, "stats")?;

    let trades_path = out_dir.join("trades.json");
    write_json(&trades_path, &report.result.trades, "trades")?;

    let equity_path = out_dir.join("equity.csv");
    let mut writer = csv::Writer::from_path(&equity_path)?;
    writer.write_record(["timestamp", "equity"])?;
    for point in &report.result.equity_curve {
        writer.write_record([point.timestamp.to_rfc3339(), format!("{:.8}", point.equity)])?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: equity_path.display().to_string(),
        source,
    })?;

    Ok(vec![stats_path, trades_path, equity_path])
}

fn write_json<T: Serialize>(path: &Path, value: &T, what: &'static str) -> Result<(), ExportError> {
    let json =
        serde_json::to_string_pretty(value).map_err(|source| ExportError::Json { what, source })?;
    fs::write(path, json).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
