//! Replay bar files through the engine and emit signals as JSON lines.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use patternlab_core::domain::Symbol;
use patternlab_core::{Bar, Direction, EngineConfig, Regime, Signal, SignalEngine};
use tracing::{info, warn};

use crate::bars::{read_bars, symbol_for};

pub struct ScanOptions {
    pub bars: Vec<PathBuf>,
    pub benchmark: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub equity: Option<f64>,
    /// Bars per symbol fed through `warm_up`; defaults to the bank's need.
    pub warmup: Option<usize>,
    /// Drop long entries while the benchmark regime is Sell.
    pub respect_regime: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub sessions: usize,
    pub signals: usize,
    pub rejected: usize,
}

pub fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    EngineConfig::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn emit(out: &mut impl Write, signal: &Signal) -> Result<()> {
    let line = serde_json::to_string(signal)?;
    writeln!(out, "{line}")?;
    Ok(())
}

pub fn run(options: &ScanOptions, out: &mut impl Write) -> Result<ScanSummary> {
    let config = load_config(options.config.as_ref())?;
    let mut engine = SignalEngine::new(config)?;
    info!(fingerprint = %engine.config().fingerprint(), "engine configured");

    let benchmark = match &options.benchmark {
        Some(path) => {
            let symbol = symbol_for(path)?;
            let bars = read_bars(path)?;
            engine = engine.with_benchmark_symbol(symbol);
            bars
        }
        None => Vec::new(),
    };

    // Live sessions keyed by date so every symbol advances together.
    let mut sessions: BTreeMap<NaiveDate, Vec<(Symbol, Bar)>> = BTreeMap::new();
    for path in &options.bars {
        let symbol = symbol_for(path)?;
        let bars = read_bars(path)?;
        let warmup = options
            .warmup
            .unwrap_or_else(|| engine.warmup_bars())
            .min(bars.len());
        let (history, live) = bars.split_at(warmup);
        let applied = engine.warm_up(&symbol, history);
        info!(symbol = %symbol, applied, live = live.len(), "loaded");
        for bar in live {
            sessions.entry(bar.date).or_default().push((symbol.clone(), *bar));
        }
    }

    let first_live = sessions.keys().next().copied();
    let mut benchmark = benchmark.into_iter().peekable();
    let mut summary = ScanSummary::default();

    for (date, batch) in &sessions {
        while let Some(bar) = benchmark.next_if(|bar| bar.date <= *date) {
            let signal = engine.update_benchmark(&bar)?;
            if let Some(signal) = signal.filter(|_| Some(bar.date) >= first_live) {
                emit(out, &signal)?;
                summary.signals += 1;
            }
        }

        let gated = options.respect_regime && engine.regime() == Regime::Sell;
        for (symbol, result) in engine.update_batch(batch) {
            let signals = match result {
                Ok(signals) => signals,
                Err(err) => {
                    warn!(symbol = %symbol, %date, %err, "bar skipped");
                    summary.rejected += 1;
                    continue;
                }
            };
            for mut signal in signals {
                if gated && signal.direction == Direction::Long {
                    continue;
                }
                if let Some(equity) = options.equity {
                    if let Err(err) = engine.size_signal(&mut signal, equity) {
                        warn!(symbol = %symbol, %err, "signal left unsized");
                    }
                }
                emit(out, &signal)?;
                summary.signals += 1;
            }
        }
        summary.sessions += 1;
    }

    info!(
        sessions = summary.sessions,
        signals = summary.signals,
        rejected = summary.rejected,
        "scan finished"
    );
    Ok(summary)
}
