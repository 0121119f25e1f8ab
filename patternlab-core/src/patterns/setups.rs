//! Setup detectors on a ready indicator bank.
//!
//! Every detector returns `false` (or `None`) until the bank has warmed up.

use crate::domain::Bar;
use crate::indicators::IndicatorBank;

/// Minimum closing range for a high-volume close.
pub const HVC_MIN_CLOSE_RANGE: f64 = 75.0;
/// Age of the recent high that marks the stock as basing.
pub const BASE_WEEKS: usize = 7;
/// Recency of the high for a key-MA pullback.
pub const PULLBACK_WEEKS: usize = 3;
pub const POCKET_PIVOT_LOOKBACK: usize = 10;
/// Day-two volume multiple of the average for an MA violation.
pub const VIOLATION_VOLUME_MULTIPLE: f64 = 1.5;

fn last_three(bank: &IndicatorBank) -> Option<(&Bar, &Bar, &Bar)> {
    let window = bank.window();
    Some((window.get(0)?, window.get(1)?, window.get(2)?))
}

fn fast_ma_at(bank: &IndicatorBank, age: usize) -> Option<f64> {
    bank.fast_ma_history().get(age).copied()
}

/// Closing range of the latest bar, 0 to 100.
pub fn close_range_pct(bank: &IndicatorBank) -> Option<f64> {
    bank.latest()?.close_range_pct()
}

/// Gain from the fast MA measured in multiples of ATR%.
pub fn atr_extension_multiple(bank: &IndicatorBank) -> Option<f64> {
    let close = bank.latest()?.close;
    let ma = bank.fast_ma()?;
    let atr_pct = bank.atr_pct(close)?;
    if ma <= 0.0 || atr_pct <= 0.0 {
        return None;
    }
    let gain_pct = (close - ma) / ma * 100.0;
    Some(gain_pct / atr_pct)
}

/// Highest volume of the extremum lookback with a strong close, unless the
/// session gapped down and closed lower.
pub fn high_volume_close(bank: &IndicatorBank) -> bool {
    let (Some(today), Some(yesterday)) = (bank.latest(), bank.previous()) else {
        return false;
    };
    if !bank.is_ready() || bank.max_volume().extreme() != Some(today.volume as f64) {
        return false;
    }
    if !today.close_range_pct().is_some_and(|pct| pct >= HVC_MIN_CLOSE_RANGE) {
        return false;
    }
    !(today.open < yesterday.close && today.close < yesterday.close)
}

/// Inside day on light volume inside a basing uptrend, entered when today
/// closes above the first pattern day's high.
pub fn inside_day(bank: &IndicatorBank) -> bool {
    let Some((today, inside, mother)) = last_three(bank) else {
        return false;
    };
    let Some(volume_avg) = bank.volume_ma() else {
        return false;
    };
    bank.is_ready()
        && inside.high < mother.high
        && inside.low > mother.low
        && inside.volume as f64 <= volume_avg
        && inside.close >= inside.open
        && bank.high_older_than_weeks(BASE_WEEKS)
        && bank.uptrending()
        && today.close > mother.high
}

/// Up day off the fast MA whose volume beats every recent down day.
pub fn pocket_pivot(bank: &IndicatorBank) -> bool {
    let (Some(today), Some(ma)) = (bank.latest(), bank.fast_ma()) else {
        return false;
    };
    bank.is_ready()
        && today.close >= today.open
        && today.volume > bank.max_down_day_volume(POCKET_PIVOT_LOOKBACK)
        && today.low <= ma
        && bank.high_older_than_weeks(BASE_WEEKS)
}

/// Bounce off the fast MA shortly after a new high.
pub fn key_ma_pullback(bank: &IndicatorBank) -> bool {
    let (Some(today), Some(yesterday)) = (bank.latest(), bank.previous()) else {
        return false;
    };
    let (Some(ma_today), Some(ma_yesterday)) = (fast_ma_at(bank, 0), fast_ma_at(bank, 1)) else {
        return false;
    };
    bank.is_ready()
        && !bank.high_older_than_weeks(PULLBACK_WEEKS)
        && yesterday.low <= ma_yesterday
        && today.close >= today.open
        && today.low > ma_today
}

/// Three-day break of the fast MA: above on day one, below on days two and
/// three, day three under day two's low, day two on heavy volume.
pub fn ma_violation(bank: &IndicatorBank) -> bool {
    let Some((day3, day2, day1)) = last_three(bank) else {
        return false;
    };
    let (Some(ma3), Some(ma2), Some(ma1)) =
        (fast_ma_at(bank, 0), fast_ma_at(bank, 1), fast_ma_at(bank, 2))
    else {
        return false;
    };
    let Some(volume_avg) = bank.volume_ma() else {
        return false;
    };
    bank.is_ready()
        && day1.close >= ma1
        && day2.close <= ma2
        && day3.close <= ma3
        && day3.close <= day2.low
        && day2.volume as f64 >= volume_avg * VIOLATION_VOLUME_MULTIPLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;
    use chrono::{Duration, NaiveDate};

    fn bank_from(data: &[(f64, f64, f64, f64, u64)]) -> IndicatorBank {
        let mut bank = IndicatorBank::builder()
            .fast_ma(3)
            .slow_ma(5)
            .volume_ma(3)
            .atr(2)
            .extremum(5)
            .window(5)
            .build()
            .unwrap();
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for (i, &(o, h, l, c, v)) in data.iter().enumerate() {
            bank.update(&Bar::new(base + Duration::days(i as i64), o, h, l, c, v));
        }
        bank
    }

    const FLAT: (f64, f64, f64, f64, u64) = (10.0, 11.0, 9.0, 10.0, 1000);

    type Row = (f64, f64, f64, f64, u64);

    /// Sixty bars: a spike high of 20 on day 0, a gentle ramp, then `tail`.
    fn basing_bank(tail: &[Row]) -> IndicatorBank {
        let mut bank = IndicatorBank::builder()
            .fast_ma(3)
            .slow_ma(5)
            .volume_ma(3)
            .atr(2)
            .extremum(60)
            .window(10)
            .build()
            .unwrap();
        let mut rows: Vec<Row> = vec![(14.0, 20.0, 13.0, 14.0, 1000)];
        for i in 1..60 - tail.len() {
            let c = 10.0 + 0.1 * i as f64;
            rows.push((c - 0.1, c + 0.3, c - 0.3, c, 1000));
        }
        rows.extend_from_slice(tail);
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for (i, &(o, h, l, c, v)) in rows.iter().enumerate() {
            bank.update(&Bar::new(base + Duration::days(i as i64), o, h, l, c, v));
        }
        bank
    }

    const MOTHER: Row = (15.6, 16.6, 15.4, 16.4, 1000);
    const INSIDE: Row = (16.2, 16.5, 15.8, 16.3, 800);
    const BREAK: Row = (16.4, 17.0, 16.3, 16.9, 1200);

    #[test]
    fn inside_day_breaks_mother_high_in_base() {
        let bank = basing_bank(&[MOTHER, INSIDE, BREAK]);
        assert!(bank.is_ready());
        assert!(bank.uptrending());
        assert!(bank.high_older_than_weeks(BASE_WEEKS));
        assert!(inside_day(&bank));
    }

    #[test]
    fn inside_day_rejects_heavy_inside_bar() {
        let heavy = (16.2, 16.5, 15.8, 16.3, 1500);
        assert!(!inside_day(&basing_bank(&[MOTHER, heavy, BREAK])));
    }

    #[test]
    fn inside_day_rejects_close_below_mother_high() {
        let weak = (16.4, 16.6, 16.3, 16.5, 1200);
        assert!(!inside_day(&basing_bank(&[MOTHER, INSIDE, weak])));
    }

    #[test]
    fn inside_day_needs_an_old_high() {
        // no spike: the ramp's latest high is the lookback high
        let mut bank = IndicatorBank::builder()
            .fast_ma(3)
            .slow_ma(5)
            .volume_ma(3)
            .atr(2)
            .extremum(5)
            .window(5)
            .build()
            .unwrap();
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let rows = [(15.0, 15.3, 14.7, 15.2, 1000), (15.2, 15.5, 14.9, 15.4, 1000), MOTHER, INSIDE, BREAK];
        for (i, &(o, h, l, c, v)) in rows.iter().enumerate() {
            bank.update(&Bar::new(base + Duration::days(i as i64), o, h, l, c, v));
        }
        assert!(bank.is_ready());
        assert!(!inside_day(&bank));
    }

    const DOWN: Row = (15.0, 15.2, 14.6, 14.7, 1500);
    const UP: Row = (14.7, 15.1, 14.6, 15.0, 900);

    fn pivot_tail(today: Row) -> Vec<Row> {
        let mut tail = vec![DOWN, UP, DOWN, UP, DOWN, UP, DOWN, UP, DOWN];
        tail.push(today);
        tail
    }

    #[test]
    fn pocket_pivot_outweighs_down_day_volume() {
        let bank = basing_bank(&pivot_tail((14.7, 15.3, 14.5, 15.2, 2000)));
        assert!(bank.is_ready());
        assert_eq!(bank.max_down_day_volume(POCKET_PIVOT_LOOKBACK), 1500);
        assert!(pocket_pivot(&bank));
    }

    #[test]
    fn pocket_pivot_rejects_volume_below_a_down_day() {
        let bank = basing_bank(&pivot_tail((14.7, 15.3, 14.5, 15.2, 1400)));
        assert!(!pocket_pivot(&bank));
    }

    #[test]
    fn pocket_pivot_needs_low_at_the_average() {
        let bank = basing_bank(&pivot_tail((15.1, 15.4, 15.05, 15.3, 2000)));
        assert!(bank.fast_ma().unwrap() < 15.05);
        assert!(!pocket_pivot(&bank));
    }

    #[test]
    fn detectors_wait_for_warmup() {
        let bank = bank_from(&[FLAT, FLAT, (10.0, 12.0, 10.0, 11.8, 5000)]);
        assert!(!bank.is_ready());
        assert!(!high_volume_close(&bank));
        assert!(!ma_violation(&bank));
    }

    #[test]
    fn high_volume_close_on_record_volume() {
        let bank = bank_from(&[FLAT, FLAT, FLAT, FLAT, (10.0, 12.0, 10.0, 11.8, 5000)]);
        assert!(bank.is_ready());
        assert_approx(close_range_pct(&bank).unwrap(), 90.0, 1e-9);
        assert!(high_volume_close(&bank));

        let quiet = bank_from(&[FLAT, FLAT, FLAT, FLAT, (10.0, 12.0, 10.0, 11.8, 900)]);
        assert!(!high_volume_close(&quiet));
    }

    #[test]
    fn high_volume_close_rejects_gap_down_close_lower() {
        let bank = bank_from(&[FLAT, FLAT, FLAT, FLAT, (9.0, 9.6, 8.0, 9.5, 5000)]);
        assert!(!high_volume_close(&bank));
    }

    #[test]
    fn ma_violation_three_day_pattern() {
        let bank = bank_from(&[
            (10.0, 10.5, 9.5, 10.0, 1000),
            (10.0, 10.5, 9.5, 10.0, 1000),
            (10.0, 12.5, 9.8, 12.0, 1000),
            (11.0, 11.0, 8.5, 9.0, 3000),
            (9.0, 9.2, 7.8, 8.0, 1000),
        ]);
        assert!(ma_violation(&bank));
    }

    #[test]
    fn ma_violation_needs_heavy_day_two() {
        let bank = bank_from(&[
            (10.0, 10.5, 9.5, 10.0, 1000),
            (10.0, 10.5, 9.5, 10.0, 1000),
            (10.0, 12.5, 9.8, 12.0, 1000),
            (11.0, 11.0, 8.5, 9.0, 1200),
            (9.0, 9.2, 7.8, 8.0, 1000),
        ]);
        assert!(!ma_violation(&bank));
    }

    #[test]
    fn key_ma_pullback_bounces_off_average() {
        let rows = [
            (10.0, 10.5, 9.5, 10.0, 1000),
            (10.0, 11.5, 9.9, 11.0, 1000),
            (11.0, 12.5, 10.8, 12.0, 1000),
            (11.5, 11.8, 10.9, 11.2, 800),
            (11.9, 12.3, 11.8, 12.1, 1200),
        ];
        assert!(key_ma_pullback(&bank_from(&rows)));

        let mut undercut = rows;
        undercut[4] = (11.9, 12.3, 11.7, 12.1, 1200);
        assert!(!key_ma_pullback(&bank_from(&undercut)));
    }

    #[test]
    fn extension_multiple_uses_atr_percent() {
        let bank = bank_from(&[FLAT, FLAT, FLAT, FLAT, (10.0, 12.0, 10.0, 11.8, 5000)]);
        let close = 11.8;
        let ma = bank.fast_ma().unwrap();
        let expected = ((close - ma) / ma * 100.0) / bank.atr_pct(close).unwrap();
        assert_approx(atr_extension_multiple(&bank).unwrap(), expected, 1e-9);
    }
}
