//! PatternLab CLI: replay bar files through the signal engine.
//!
//! Commands:
//! - `scan`: warm up each symbol, replay the rest, print signals as JSON lines
//! - `synth`: write a seeded random-walk bar file
//!
//! Logs go to stderr (`RUST_LOG` controls the level); stdout carries only
//! signals.

mod bars;
mod scan;
mod synth;

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::scan::ScanOptions;

#[derive(Parser)]
#[command(name = "patternlab", about = "PatternLab CLI: breakout, reversal and regime signals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay CSV bar files and print signals as JSON lines.
    Scan {
        /// Bar files (date,open,high,low,close,volume); the file stem is the symbol.
        #[arg(long = "bars", required = true, num_args = 1..)]
        bars: Vec<PathBuf>,

        /// Benchmark bar file driving the market regime.
        #[arg(long)]
        benchmark: Option<PathBuf>,

        /// TOML engine configuration. Defaults apply to missing keys.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Account equity used to size signals.
        #[arg(long)]
        equity: Option<f64>,

        /// Bars per symbol used for warm-up. Defaults to the slowest indicator's lookback.
        #[arg(long)]
        warmup: Option<usize>,

        /// Suppress long signals while the benchmark regime is Sell.
        #[arg(long, default_value_t = false)]
        respect_regime: bool,
    },
    /// Generate a seeded random-walk bar file.
    Synth {
        /// Symbol; names the output file when --out is omitted.
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Number of weekday sessions.
        #[arg(long, default_value_t = 400)]
        days: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First session (YYYY-MM-DD).
        #[arg(long, default_value = "2022-01-03")]
        start: String,

        /// Output path. Defaults to <symbol>.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            bars,
            benchmark,
            config,
            equity,
            warmup,
            respect_regime,
        } => {
            let options = ScanOptions {
                bars,
                benchmark,
                config,
                equity,
                warmup,
                respect_regime,
            };
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            scan::run(&options, &mut out)?;
            out.flush()?;
            Ok(())
        }
        Commands::Synth {
            symbol,
            days,
            seed,
            start,
            out,
        } => {
            let start = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
                .with_context(|| format!("invalid --start date: {start}"))?;
            let path = out.unwrap_or_else(|| PathBuf::from(format!("{symbol}.csv")));
            let generated = synth::random_walk(start, days, seed);
            bars::write_bars(&path, &generated)?;
            info!(symbol = %symbol, days, seed, path = %path.display(), "wrote synthetic bars");
            Ok(())
        }
    }
}
