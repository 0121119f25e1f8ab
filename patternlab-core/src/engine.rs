//! Signal engine facade.
//!
//! Owns one `InstrumentState` per tracked symbol plus the benchmark's regime
//! detector. Instruments are inserted on first sighting and removed when they
//! leave the universe; no state is shared between them, so a batch of bars
//! for distinct symbols is applied in parallel.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::domain::{Bar, Direction, Signal, SignalKind, Symbol};
use crate::error::EngineError;
use crate::indicators::IndicatorBank;
use crate::patterns::{setups, Breakout, BreakoutDetector, ReversalClassifier};
use crate::regime::{Regime, RegimeChange, RegimeDetector};
use crate::sizers::{ConservativeSizer, Sizer, SizingInput};

/// Per-instrument state, exclusively owned by the engine.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    bank: IndicatorBank,
    /// Most recent breakout seen during `update`.
    last_breakout: Option<Breakout>,
}

impl InstrumentState {
    fn new(bank: IndicatorBank) -> Self {
        Self {
            bank,
            last_breakout: None,
        }
    }

    pub fn bank(&self) -> &IndicatorBank {
        &self.bank
    }

    pub fn last_breakout(&self) -> Option<&Breakout> {
        self.last_breakout.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.bank.is_ready()
    }
}

#[derive(Debug, Clone)]
struct Detectors {
    breakouts: BreakoutDetector,
    reversals: ReversalClassifier,
}

impl Detectors {
    fn apply(&self, state: &mut InstrumentState, bar: &Bar) {
        state.bank.update(bar);
        if let Some(breakout) = self.breakouts.detect(&state.bank) {
            debug!(level = breakout.level, kind = ?breakout.kind, date = %breakout.date, "breakout");
            state.last_breakout = Some(breakout);
        }
    }

    fn evaluate(&self, symbol: &str, state: &InstrumentState) -> Vec<Signal> {
        let bank = &state.bank;
        let Some(today) = bank.latest().filter(|_| bank.is_ready()) else {
            debug!(symbol, bars = bank.bars_seen(), needed = bank.warmup_bars(), "not ready");
            return Vec::new();
        };
        let date = today.date;
        let mut signals = Vec::new();

        if let Some(breakout) = &state.last_breakout {
            if breakout.date == date || self.breakouts.confirm(bank, breakout) {
                signals.push(Signal::new(symbol, date, SignalKind::Breakout).with_level(breakout.level));
            }
        }

        if let Some(reversal) = self.reversals.classify(bank.window()) {
            let kind = match reversal.direction {
                Direction::Long => SignalKind::ReversalLong,
                _ => SignalKind::ReversalShort,
            };
            signals.push(Signal::new(symbol, date, kind).with_stop(reversal.stop));
        }

        let long_setups: [(fn(&IndicatorBank) -> bool, SignalKind); 4] = [
            (setups::high_volume_close, SignalKind::HighVolumeClose),
            (setups::inside_day, SignalKind::InsideDay),
            (setups::pocket_pivot, SignalKind::PocketPivot),
            (setups::key_ma_pullback, SignalKind::KeyMaPullback),
        ];
        if bank.uptrending() {
            for (detect, kind) in long_setups {
                if detect(bank) {
                    signals.push(Signal::new(symbol, date, kind));
                }
            }
        }
        let downtrending = matches!((bank.fast_ma(), bank.slow_ma()), (Some(fast), Some(slow)) if fast < slow);
        if downtrending && setups::ma_violation(bank) {
            signals.push(Signal::new(symbol, date, SignalKind::MaViolation));
        }
        signals
    }
}

fn track<'a>(
    instruments: &'a mut HashMap<Symbol, InstrumentState>,
    template: &IndicatorBank,
    symbol: &str,
) -> &'a mut InstrumentState {
    instruments.entry(symbol.to_string()).or_insert_with(|| {
        info!(symbol, "tracking instrument");
        InstrumentState::new(template.clone())
    })
}

fn checked(symbol: &str, bar: &Bar) -> Result<(), EngineError> {
    bar.validate().map_err(|err| {
        warn!(symbol, %err, "rejected bar");
        EngineError::from(err)
    })
}

/// Name given to regime signals.
pub const BENCHMARK_SYMBOL: &str = "benchmark";

pub struct SignalEngine {
    config: EngineConfig,
    template: IndicatorBank,
    instruments: HashMap<Symbol, InstrumentState>,
    detectors: Detectors,
    regime: RegimeDetector,
    sizer: Box<dyn Sizer>,
    benchmark: Symbol,
}

impl SignalEngine {
    /// Validate `config` and build an engine tracking no instruments.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let template = IndicatorBank::from_config(&config.indicators)?;
        let detectors = Detectors {
            breakouts: BreakoutDetector::new(
                config.levels.clone(),
                config.breakout.clone(),
                config.vcp.clone(),
            ),
            reversals: ReversalClassifier::new(config.reversal.clone()),
        };
        let regime = RegimeDetector::new(config.regime.clone())?;
        let sizer = Box::new(ConservativeSizer::new(&config.sizing)?);
        Ok(Self {
            config,
            template,
            instruments: HashMap::new(),
            detectors,
            regime,
            sizer,
            benchmark: BENCHMARK_SYMBOL.to_string(),
        })
    }

    /// Replace the position sizer.
    pub fn with_sizer(mut self, sizer: impl Sizer + 'static) -> Self {
        self.sizer = Box::new(sizer);
        self
    }

    /// Symbol written on regime signals.
    pub fn with_benchmark_symbol(mut self, symbol: impl Into<Symbol>) -> Self {
        self.benchmark = symbol.into();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bars a new instrument needs before it is ready.
    pub fn warmup_bars(&self) -> usize {
        self.template.warmup_bars()
    }

    /// Backfill history for `symbol`, tracking it if needed.
    ///
    /// Insane bars are skipped. Returns the number of bars applied.
    pub fn warm_up<'a>(&mut self, symbol: &str, bars: impl IntoIterator<Item = &'a Bar>) -> usize {
        let state = track(&mut self.instruments, &self.template, symbol);
        let mut applied = 0;
        for bar in bars {
            if checked(symbol, bar).is_err() {
                continue;
            }
            self.detectors.apply(state, bar);
            applied += 1;
        }
        debug!(symbol, applied, ready = state.is_ready(), "warm-up finished");
        applied
    }

    /// Apply the next bar for `symbol`, tracking it on first sighting.
    pub fn update(&mut self, symbol: &str, bar: &Bar) -> Result<(), EngineError> {
        checked(symbol, bar)?;
        let state = track(&mut self.instruments, &self.template, symbol);
        self.detectors.apply(state, bar);
        Ok(())
    }

    /// Apply one bar per symbol in parallel and evaluate each symbol.
    ///
    /// Results are sorted by symbol. When a symbol appears more than once only
    /// its last bar is applied. Rejected bars never start tracking a symbol.
    pub fn update_batch(&mut self, batch: &[(Symbol, Bar)]) -> Vec<(Symbol, Result<Vec<Signal>, EngineError>)> {
        let mut bars: HashMap<&str, &Bar> = HashMap::with_capacity(batch.len());
        for (symbol, bar) in batch {
            if bars.insert(symbol.as_str(), bar).is_some() {
                warn!(symbol = %symbol, "duplicate symbol in batch, keeping the last bar");
            }
        }
        let mut results: Vec<(Symbol, Result<Vec<Signal>, EngineError>)> = Vec::with_capacity(bars.len());
        bars.retain(|symbol, bar| match checked(symbol, *bar) {
            Ok(()) => true,
            Err(err) => {
                results.push((symbol.to_string(), Err(err)));
                false
            }
        });
        for symbol in bars.keys() {
            track(&mut self.instruments, &self.template, symbol);
        }

        let detectors = &self.detectors;
        let applied = self
            .instruments
            .iter_mut()
            .filter_map(|(symbol, state)| bars.get(symbol.as_str()).map(|bar| (symbol, state, *bar)))
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|(symbol, state, bar)| {
                detectors.apply(state, bar);
                (symbol.clone(), Ok(detectors.evaluate(symbol, state)))
            });
        results.par_extend(applied);
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Stop tracking `symbol`.
    pub fn remove(&mut self, symbol: &str) -> Option<InstrumentState> {
        let removed = self.instruments.remove(symbol);
        if removed.is_some() {
            info!(symbol, "dropped instrument");
        }
        removed
    }

    /// Drop every instrument not in `universe`. Returns the removed symbols, sorted.
    pub fn retain_universe<S: AsRef<str>>(&mut self, universe: &[S]) -> Vec<Symbol> {
        let keep: HashSet<&str> = universe.iter().map(|s| s.as_ref()).collect();
        let mut removed: Vec<Symbol> = self
            .instruments
            .keys()
            .filter(|symbol| !keep.contains(symbol.as_str()))
            .cloned()
            .collect();
        removed.sort();
        for symbol in &removed {
            self.remove(symbol);
        }
        removed
    }

    pub fn is_ready(&self, symbol: &str) -> bool {
        self.instruments.get(symbol).is_some_and(InstrumentState::is_ready)
    }

    pub fn state(&self, symbol: &str) -> Option<&InstrumentState> {
        self.instruments.get(symbol)
    }

    /// Tracked symbols, sorted.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.instruments.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }

    /// Signals for the latest bar of `symbol`. Empty until the bank is ready.
    pub fn evaluate(&self, symbol: &str) -> Result<Vec<Signal>, EngineError> {
        let state = self
            .instruments
            .get(symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(symbol.to_string()))?;
        Ok(self.detectors.evaluate(symbol, state))
    }

    /// Apply the next benchmark bar. Returns a signal when the regime changes.
    pub fn update_benchmark(&mut self, bar: &Bar) -> Result<Option<Signal>, EngineError> {
        checked(&self.benchmark, bar)?;
        let Some(RegimeChange { date, to, .. }) = self.regime.update(bar) else {
            return Ok(None);
        };
        let kind = match to {
            Regime::Sell => SignalKind::Distribution,
            Regime::Buy => SignalKind::FollowThrough,
        };
        Ok(Some(Signal::new(self.benchmark.as_str(), date, kind)))
    }

    pub fn regime(&self) -> Regime {
        self.regime.regime()
    }

    pub fn regime_detector(&self) -> &RegimeDetector {
        &self.regime
    }

    /// Fill `signal.size_hint` from the instrument's latest close and ATR.
    pub fn size_signal(&self, signal: &mut Signal, equity: f64) -> Result<u64, EngineError> {
        let state = self
            .instruments
            .get(&signal.symbol)
            .ok_or_else(|| EngineError::UnknownSymbol(signal.symbol.clone()))?;
        let price = state.bank.latest().map_or(f64::NAN, |bar| bar.close);
        let input = SizingInput {
            price,
            atr: state.bank.atr(),
        };
        let size = self.sizer.size(equity, &input)?;
        signal.size_hint = Some(size);
        Ok(size)
    }
}
