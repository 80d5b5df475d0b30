//! `spotlab`: run and validate replay sessions from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use spotlab_core::engine::{NullProgress, ReplayProgress, StdoutProgress};
use spotlab_runner::{execute, export_run, load_symbol_bars, RunConfig};

#[derive(Parser)]
#[command(name = "spotlab", version, about = "Spot trading replay and risk engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a replay session and export its artifacts.
    Run {
        /// Path to the run configuration (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Directory holding per-symbol CSV bar files.
        #[arg(long)]
        data_dir: PathBuf,
        /// Output directory for stats.json, trades.json and equity.csv.
        #[arg(long, default_value = "out")]
        out: PathBuf,
        /// Suppress progress output.
        #[arg(long)]
        quiet: bool,
    },
    /// Check a config and its data files without running the engine.
    Validate {
        /// Path to the run configuration (TOML).
        #[arg(long)]
        config: PathBuf,
        /// Directory holding per-symbol CSV bar files.
        #[arg(long)]
        data_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            data_dir,
            out,
            quiet,
        } => run(config, data_dir, out, quiet),
        Command::Validate { config, data_dir } => validate(config, data_dir),
    }
}

fn run(config_path: PathBuf, data_dir: PathBuf, out: PathBuf, quiet: bool) -> anyhow::Result<()> {
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut stdout_progress = StdoutProgress;
    let mut null_progress = NullProgress;
    let progress: &mut dyn ReplayProgress = if quiet {
        &mut null_progress
    } else {
        &mut stdout_progress
    };

    let report = execute(&config, &data_dir, progress).context("replay failed")?;
    let written = export_run(&report, &out)
        .with_context(|| format!("exporting to {}", out.display()))?;

    let stats = &report.result.stats;
    println!("fingerprint: {}", report.result.fingerprint);
    println!(
        "trades: {} (wins {}, losses {}, win rate {:.1}%)",
        stats.total_trades, stats.wins, stats.losses, stats.win_rate_pct
    );
    println!(
        "balance: {:.2} -> {:.2} ({:+.2}%, max drawdown {:.2}%)",
        stats.initial_balance, stats.final_balance, stats.roi_pct, stats.max_drawdown_pct
    );
    println!("ignored opportunities: {}", stats.ignored_opportunities);
    if !report.result.signal_errors.is_empty() {
        println!("signal errors: {}", report.result.signal_errors.len());
    }
    for path in written {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn validate(config_path: PathBuf, data_dir: PathBuf) -> anyhow::Result<()> {
    let config = RunConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let mut symbols = vec![config.reference_symbol.clone()];
    for symbol in &config.symbols {
        if !symbols.contains(symbol) {
            symbols.push(symbol.clone());
        }
    }

    for symbol in &symbols {
        let bars = load_symbol_bars(&data_dir, symbol)
            .with_context(|| format!("validating {symbol}"))?;
        let with_indicators = bars.iter().filter(|b| b.has_indicators()).count();
        println!(
            "{symbol}: {} bars, {} with indicators, {} .. {}",
            bars.len(),
            with_indicators,
            bars.first().map(|b| b.timestamp.to_rfc3339()).unwrap_or_default(),
            bars.last().map(|b| b.timestamp.to_rfc3339()).unwrap_or_default(),
        );
    }
    println!("ok");
    Ok(())
}
