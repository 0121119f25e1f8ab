//! Property tests for engine invariants.
//!
//! 1. Extremum age resets exactly on new extremes and never outlives the period
//! 2. Resistance clustering is deterministic and spaced by `range_filter`
//! 3. A level cross on volume at or below average never signals
//! 4. Position size times ATR stays within the risk budget
//! 5. VCP verdict follows the depth ordering
//! 6. Reversal checks report the first matching pattern only

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use patternlab_core::config::{LevelConfig, ReversalConfig};
use patternlab_core::domain::BarWindow;
use patternlab_core::indicators::{Extremum, PriceSource};
use patternlab_core::patterns::reversal::classify;
use patternlab_core::patterns::{
    classify_depths, cluster_peaks, detect_breakout, LevelDetector, Peak, ReversalPattern, ResistanceLevel,
    VcpVerdict,
};
use patternlab_core::sizers::{risk_size, Sizer, SizingInput, VolatilitySizer};
use patternlab_core::{Bar, Direction};

// ── Strategies (proptest) ────────────────────────────────────────────

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(i as i64)
}

fn arb_price() -> impl Strategy<Value = f64> {
    (10.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// A sane bar built from an anchor price and three offsets.
fn arb_bar() -> impl Strategy<Value = Bar> {
    (arb_price(), 0.0..1.0_f64, 0.0..1.0_f64, 0.01..10.0_f64, 1u64..1_000_000)
        .prop_map(|(low, open_frac, close_frac, range, volume)| {
            let high = low + range;
            Bar::new(day(1), low + range * open_frac, high, low, low + range * close_frac, volume)
        })
}

fn arb_peaks() -> impl Strategy<Value = Vec<Peak>> {
    prop::collection::vec(arb_price(), 0..40).prop_map(|prices| {
        prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| Peak {
                price,
                formed: day(i * 7),
            })
            .collect()
    })
}

// ── 1. Monotonic extrema ─────────────────────────────────────────────

proptest! {
    #[test]
    fn max_age_resets_on_new_high(values in prop::collection::vec(1.0..100.0_f64, 1..80)) {
        // period covers the whole sequence so nothing expires
        let mut max = Extremum::max(100, PriceSource::High);
        let mut best = f64::NEG_INFINITY;
        let mut prev_age: Option<usize> = None;
        for v in values {
            max.push(v);
            let age = max.periods_since().unwrap();
            if v >= best {
                best = v;
                prop_assert_eq!(age, 0);
            } else {
                prop_assert_eq!(Some(age), prev_age.map(|a| a + 1));
            }
            prev_age = Some(age);
        }
    }

    #[test]
    fn min_age_resets_on_new_low(values in prop::collection::vec(1.0..100.0_f64, 1..80)) {
        let mut min = Extremum::min(100, PriceSource::Low);
        let mut best = f64::INFINITY;
        let mut prev_age: Option<usize> = None;
        for v in values {
            min.push(v);
            let age = min.periods_since().unwrap();
            if v <= best {
                best = v;
                prop_assert_eq!(age, 0);
            } else {
                prop_assert_eq!(Some(age), prev_age.map(|a| a + 1));
            }
            prev_age = Some(age);
        }
    }

    /// Past the period the extreme falls back to the strongest survivor,
    /// so the age is bounded by `period - 1`.
    #[test]
    fn expired_max_falls_back_to_window_survivor(
        period in 2..20_usize,
        values in prop::collection::vec(1.0..100.0_f64, 1..120),
    ) {
        let mut max = Extremum::max(period, PriceSource::High);
        for (n, &v) in values.iter().enumerate() {
            max.push(v);
            let start = (n + 1).saturating_sub(period);
            let window = &values[start..=n];
            let best = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let newest = window.iter().rposition(|&x| x == best).unwrap();
            let age = max.periods_since().unwrap();
            prop_assert!(age < period, "age {age} outlived period {period}");
            prop_assert_eq!(max.extreme(), Some(best));
            prop_assert_eq!(age, window.len() - 1 - newest);
        }
    }
}

// ── 2. Resistance clustering ─────────────────────────────────────────

proptest! {
    #[test]
    fn clustering_is_deterministic_and_spaced(
        peaks in arb_peaks(),
        range_filter in 0.001..0.05_f64,
    ) {
        let first = cluster_peaks(&peaks, range_filter, 1);
        let second = cluster_peaks(&peaks, range_filter, 1);
        prop_assert_eq!(&first, &second);
        for pair in first.windows(2) {
            prop_assert!(pair[1].price >= pair[0].price * (1.0 + range_filter));
        }
        let touches: usize = first.iter().map(|l| l.touches).sum();
        prop_assert_eq!(touches, peaks.len());
    }

    #[test]
    fn representative_is_lowest_member(peaks in arb_peaks(), range_filter in 0.001..0.05_f64) {
        let levels = cluster_peaks(&peaks, range_filter, 1);
        for level in &levels {
            prop_assert!(peaks.iter().any(|p| p.price == level.price && p.formed == level.formed));
        }
        if let (Some(lowest), Some(first)) = (
            peaks.iter().map(|p| p.price).min_by(|a, b| a.total_cmp(b)),
            levels.first(),
        ) {
            prop_assert_eq!(first.price, lowest);
        }
    }

    #[test]
    fn level_detection_repeats_on_unchanged_window(
        closes in prop::collection::vec(50.0..150.0_f64, 30..200),
    ) {
        let mut window = BarWindow::new(200);
        for (i, &c) in closes.iter().enumerate() {
            window.push(Bar::new(day(i), c, c * 1.02, c * 0.98, c, 1000));
        }
        let detector = LevelDetector::new(LevelConfig::default());
        prop_assert_eq!(detector.detect(&window), detector.detect(&window));
    }
}

// ── 3. Breakout needs volume confirmation ────────────────────────────

proptest! {
    #[test]
    fn no_breakout_without_volume(
        mut levels in prop::collection::vec(arb_price(), 1..10),
        today in arb_bar(),
        yesterday in arb_bar(),
        excess in 0.0..1_000.0_f64,
    ) {
        levels.sort_by(|a, b| a.total_cmp(b));
        let levels: Vec<ResistanceLevel> = levels
            .into_iter()
            .map(|price| ResistanceLevel { price, formed: day(0), touches: 1 })
            .collect();
        let volume_avg = today.volume as f64 + excess;
        prop_assert!(detect_breakout(&levels, &today, &yesterday, volume_avg).is_none());
    }
}

// ── 4. Position sizing bound ─────────────────────────────────────────

proptest! {
    #[test]
    fn size_stays_within_risk_budget(
        equity in 1_000.0..10_000_000.0_f64,
        risk_fraction in 0.0001..=1.0_f64,
        atr in 0.01..100.0_f64,
    ) {
        let size = risk_size(equity, risk_fraction, atr).unwrap();
        let budget = equity * risk_fraction;
        // rounding adds at most half a unit of risk
        prop_assert!(size as f64 * atr <= budget + atr / 2.0 + 1e-6);

        let sizer = VolatilitySizer::new(risk_fraction).unwrap();
        let input = SizingInput { price: 100.0, atr: Some(atr) };
        prop_assert_eq!(sizer.size(equity, &input).unwrap(), size);
    }

    #[test]
    fn non_positive_risk_never_sizes(equity in 1_000.0..1_000_000.0_f64, risk in -100.0..=0.0_f64) {
        prop_assert!(risk_size(equity, 0.01, risk).is_err());
    }
}

// ── 5. VCP depth ordering ────────────────────────────────────────────

proptest! {
    #[test]
    fn strictly_shrinking_depths_contract(mut depths in prop::collection::vec(0.01..0.5_f64, 2..12)) {
        depths.sort_by(|a, b| b.total_cmp(a));
        depths.dedup();
        prop_assume!(depths.len() >= 2);
        prop_assert_eq!(classify_depths(&depths, 0.6), VcpVerdict::Contracting);
    }

    #[test]
    fn growing_depths_expand(mut depths in prop::collection::vec(0.01..0.5_f64, 2..12)) {
        depths.sort_by(|a, b| a.total_cmp(b));
        prop_assert_eq!(classify_depths(&depths, 0.6), VcpVerdict::Expanding);
    }
}

// ── 6. Reversal priority ─────────────────────────────────────────────

proptest! {
    #[test]
    fn first_matching_pattern_wins(today in arb_bar(), yesterday in arb_bar()) {
        let config = ReversalConfig { require_rising_volume: false, ..ReversalConfig::default() };
        let signal = classify(&today, &yesterday, &config);
        let first_match = ReversalPattern::PRIORITY
            .iter()
            .copied()
            .find(|p| p.check(&today, &yesterday) != Direction::Flat);
        prop_assert_eq!(signal.map(|s| s.pattern), first_match);
        if let Some(signal) = signal {
            prop_assert_eq!(signal.direction, signal.pattern.check(&today, &yesterday));
            match signal.direction {
                Direction::Short => prop_assert!(signal.stop > today.high),
                Direction::Long => prop_assert!(signal.stop < today.low),
                Direction::Flat => prop_assert!(false, "flat signal"),
            }
        }
    }

    #[test]
    fn reversal_day_subsumes_key_reversal(today in arb_bar(), yesterday in arb_bar()) {
        if ReversalPattern::KeyReversalDay.check(&today, &yesterday) != Direction::Flat {
            let config = ReversalConfig { require_rising_volume: false, ..ReversalConfig::default() };
            let signal = classify(&today, &yesterday, &config).unwrap();
            prop_assert_eq!(signal.pattern, ReversalPattern::ReversalDay);
        }
    }
}
