//! Seeded random-walk bars for demos and smoke tests.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use patternlab_core::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// `days` weekday sessions starting at `start`, drifting slightly upward.
pub fn random_walk(start: NaiveDate, days: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(days);
    let mut date = start;
    let mut close: f64 = 100.0;
    while bars.len() < days {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
            continue;
        }
        let open = close * (1.0 + rng.gen_range(-0.005..0.005));
        close = (open * (1.0 + rng.gen_range(-0.025..0.027))).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));
        let volume = rng.gen_range(500_000..2_000_000);
        bars.push(Bar::new(date, open, high, low, close, volume));
        date += Duration::days(1);
    }
    bars
}
