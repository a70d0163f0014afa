// =============================================================================
// Synthetic Bar Generator: Seeded OHLCV series for demos and tests
// =============================================================================
//
// Every pattern is a random walk on the close with a pattern-specific drift
// and volatility. Highs and lows are padded outside the open/close body so
// each bar satisfies the OHLC invariants. Prices are floored at 0.1.
//
// The generator owns a seeded `StdRng`, so a given (seed, pattern, length)
// always reproduces the same series.
// =============================================================================

use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::types::PriceBar;

const PRICE_FLOOR: f64 = 0.1;

/// Shape of a generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// 2% daily noise, no drift.
    Random,
    /// +10% drift over the run, 1.5% noise.
    Bullish,
    /// -10% drift over the run, 1.5% noise.
    Bearish,
    /// Sine oscillation around the start price.
    Sideways,
    /// 4% daily noise.
    Volatile,
    /// 10% chance per day of a ±5% opening gap.
    Gaps,
    /// Closes bounce off ±10% bands around the start price.
    SupportResistance,
    /// -5% per day with heavy noise.
    Crash,
    /// Accelerating +3% per day.
    Bubble,
    /// Quiet walk with a single 20% drop at the midpoint.
    FlashCrash,
    /// Hourly bars with 0.5% noise.
    Intraday,
}

impl Pattern {
    pub const ALL: [Pattern; 11] = [
        Pattern::Random,
        Pattern::Bullish,
        Pattern::Bearish,
        Pattern::Sideways,
        Pattern::Volatile,
        Pattern::Gaps,
        Pattern::SupportResistance,
        Pattern::Crash,
        Pattern::Bubble,
        Pattern::FlashCrash,
        Pattern::Intraday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Sideways => "sideways",
            Self::Volatile => "volatile",
            Self::Gaps => "gaps",
            Self::SupportResistance => "support_resistance",
            Self::Crash => "crash",
            Self::Bubble => "bubble",
            Self::FlashCrash => "flash_crash",
            Self::Intraday => "intraday",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        match Self::ALL.iter().find(|p| p.as_str() == wanted) {
            Some(p) => Ok(*p),
            None => bail!("unknown pattern '{s}'"),
        }
    }
}

/// Seeded OHLCV generator.
pub struct BarGenerator {
    rng: StdRng,
}

impl BarGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `count` bars of `pattern` starting at `start` / `start_price`.
    ///
    /// Daily spacing for every pattern except `Intraday`, which is hourly.
    pub fn generate(
        &mut self,
        pattern: Pattern,
        count: usize,
        start_price: f64,
        start: NaiveDateTime,
    ) -> Vec<PriceBar> {
        let step = match pattern {
            Pattern::Intraday => Duration::hours(1),
            _ => Duration::days(1),
        };

        let start_price = start_price.max(PRICE_FLOOR);
        let support = start_price * 0.9;
        let resistance = start_price * 1.1;

        let mut bars = Vec::with_capacity(count);
        let mut price = start_price;
        let mut timestamp = start;

        for i in 0..count {
            let (open, close, wick, volume) = match pattern {
                Pattern::Random => {
                    let close = price + self.gauss() * 0.02 * price;
                    (price, close, 0.01 * price, self.volume(100_000, 900_000, 1))
                }
                Pattern::Bullish | Pattern::Bearish => {
                    let strength = if pattern == Pattern::Bullish { 0.1 } else { -0.1 };
                    let drift = strength * price / count as f64;
                    let close = price + drift + self.gauss() * 0.015 * price;
                    (price, close, 0.008 * price, self.volume(150_000, 800_000, 1))
                }
                Pattern::Sideways => {
                    let open = start_price + (i as f64 * 0.1).sin() * 0.02 * start_price;
                    let close = open + self.gauss() * 0.01 * start_price;
                    (open, close, 0.005 * start_price, self.volume(120_000, 600_000, 1))
                }
                Pattern::Volatile => {
                    let close = price + self.gauss() * 0.04 * price;
                    (price, close, 0.02 * price, self.volume(200_000, 1_000_000, 1))
                }
                Pattern::Gaps => {
                    let open = if self.rng.gen::<f64>() < 0.1 {
                        price * (1.0 + (self.rng.gen::<f64>() - 0.5) * 0.1)
                    } else {
                        price
                    };
                    let close = open + self.gauss() * 0.02 * open;
                    (open, close, 0.01 * open, self.volume(100_000, 900_000, 1))
                }
                Pattern::SupportResistance => {
                    let mut close = price + self.gauss() * 0.015 * price;
                    if close < support && self.rng.gen::<f64>() < 0.7 {
                        close = support + self.rng.gen::<f64>() * 0.02 * support;
                    } else if close > resistance && self.rng.gen::<f64>() < 0.7 {
                        close = resistance - self.rng.gen::<f64>() * 0.02 * resistance;
                    }
                    let near_level = (close - support).abs() < 0.02 * support
                        || (close - resistance).abs() < 0.02 * resistance;
                    let base = if near_level { 225_000 } else { 150_000 };
                    (price, close, 0.008 * price, self.volume(base, 500_000, 1))
                }
                Pattern::Crash => {
                    let close = price - 0.05 * price + self.gauss() * 0.04 * price;
                    (price, close, 0.01 * price, self.volume(150_000, 800_000, 3))
                }
                Pattern::Bubble => {
                    let strength = (1.0 + i as f64 / count as f64).min(2.0);
                    let close = price + 0.03 * price * strength + self.gauss() * 0.03 * price;
                    (price, close, 0.01 * price, self.volume(150_000, 800_000, 2))
                }
                Pattern::FlashCrash => {
                    if i == count / 2 {
                        (price, price * 0.8, 0.01 * price, self.volume(150_000, 800_000, 5))
                    } else {
                        let close = price + self.gauss() * 0.01 * price;
                        (price, close, 0.01 * price, self.volume(150_000, 800_000, 1))
                    }
                }
                Pattern::Intraday => {
                    let close = price + self.gauss() * 0.005 * price;
                    (price, close, 0.002 * price, self.volume(5_000, 50_000, 1))
                }
            };

            let open = open.max(PRICE_FLOOR);
            let close = close.max(PRICE_FLOOR);
            let high = open.max(close) + self.rng.gen::<f64>() * wick;
            let low = (open.min(close) - self.rng.gen::<f64>() * wick).max(PRICE_FLOOR);

            bars.push(PriceBar::new(timestamp, open, high, low, close, volume));

            price = close;
            timestamp += step;
        }

        bars
    }

    fn gauss(&mut self) -> f64 {
        StandardNormal.sample(&mut self.rng)
    }

    fn volume(&mut self, base: u64, spread: u64, multiplier: u64) -> u64 {
        (base + self.rng.gen_range(0..spread)) * multiplier
    }
}
