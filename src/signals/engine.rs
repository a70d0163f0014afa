// =============================================================================
// Signal Engine: Priority-ordered crossover and reversal rules
// =============================================================================
//
// Evaluates every bar from index 50 onward and emits at most one signal per
// bar. Rules are tried top-down; the first one that fires wins:
//
//   1. Bullish crossover  EMA20 crosses above EMA50 and RSI > 55  => LONG
//   2. Bearish crossover  EMA20 crosses below EMA50 and RSI < 45  => SHORT
//   3. Overbought         RSI > 70                                => REVERSAL
//   4. Oversold           RSI < 30                                => REVERSAL
//
// MACD (12, 26, 9) never gates a signal. A MACD/signal-line cross and the
// histogram slope only feed the composite confidence and the reason text.
// =============================================================================

use tracing::{debug, warn};

use crate::indicators::{self, calculate_ema, calculate_macd, calculate_rsi, IndicatorSeries, MacdResult};
use crate::signals::confidence::{composite_confidence, ConfidenceInputs, RsiBand};
use crate::types::{PriceBar, Signal, SignalType};

pub const EMA_SHORT_PERIOD: usize = 20;
pub const EMA_LONG_PERIOD: usize = 50;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

/// Minimum number of bars `analyze_trend` needs before it evaluates anything.
pub const MIN_BARS: usize = EMA_LONG_PERIOD + 1;

const BULLISH_RSI: f64 = 55.0;
const BEARISH_RSI: f64 = 45.0;
const OVERBOUGHT_RSI: f64 = 70.0;
const OVERSOLD_RSI: f64 = 30.0;

// =============================================================================
// Indicator bundle
// =============================================================================

/// Every indicator series the engine reads, aligned with the input bars.
#[derive(Debug, Clone)]
pub struct TrendIndicators {
    pub ema_short: IndicatorSeries,
    pub ema_long: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub macd: MacdResult,
}

impl TrendIndicators {
    pub fn compute(closes: &[f64]) -> Self {
        Self {
            ema_short: calculate_ema(closes, EMA_SHORT_PERIOD),
            ema_long: calculate_ema(closes, EMA_LONG_PERIOD),
            rsi: calculate_rsi(closes, RSI_PERIOD),
            macd: calculate_macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
        }
    }
}

// =============================================================================
// Per-bar context
// =============================================================================

/// Indicator readings at bar `i` and `i - 1`, as seen by the rules.
#[derive(Debug, Clone, Copy)]
struct BarContext<'a> {
    bar: &'a PriceBar,
    ema_short: f64,
    ema_long: f64,
    prev_ema_short: f64,
    prev_ema_long: f64,
    rsi: f64,
    macd_bull_confirm: bool,
    macd_bear_confirm: bool,
    histogram_slope: f64,
    ema_spread_pct: f64,
}

impl<'a> BarContext<'a> {
    /// Build the context for index `i >= 1`.
    ///
    /// Returns `None` when either EMA (current or previous) or the current
    /// RSI is undefined. Undefined MACD readings only disable the
    /// confirmation and slope terms.
    fn at(bar: &'a PriceBar, ind: &TrendIndicators, i: usize) -> Option<Self> {
        let ema_short = ind.ema_short[i]?;
        let ema_long = ind.ema_long[i]?;
        let prev_ema_short = ind.ema_short[i - 1]?;
        let prev_ema_long = ind.ema_long[i - 1]?;
        let rsi = ind.rsi[i]?;

        let macd = &ind.macd;
        let (macd_bull_confirm, macd_bear_confirm) = match (
            macd.macd_line[i],
            macd.signal_line[i],
            macd.macd_line[i - 1],
            macd.signal_line[i - 1],
        ) {
            (Some(line), Some(sig), Some(prev_line), Some(prev_sig)) => (
                prev_line <= prev_sig && line > sig,
                prev_line >= prev_sig && line < sig,
            ),
            _ => (false, false),
        };

        let histogram_slope = match (macd.histogram[i], macd.histogram[i - 1]) {
            (Some(h), Some(prev_h)) => h - prev_h,
            _ => 0.0,
        };

        let ema_spread_pct = if ema_long != 0.0 {
            (ema_short - ema_long).abs() / ema_long.abs()
        } else {
            0.0
        };

        Some(Self {
            bar,
            ema_short,
            ema_long,
            prev_ema_short,
            prev_ema_long,
            rsi,
            macd_bull_confirm,
            macd_bear_confirm,
            histogram_slope,
            ema_spread_pct,
        })
    }

    fn signal(&self, signal_type: SignalType, confidence: f64, reason: String) -> Signal {
        Signal {
            timestamp: self.bar.timestamp,
            signal_type,
            confidence,
            reason,
            price: self.bar.close,
        }
    }
}

fn macd_phrase(confirmed: bool) -> &'static str {
    if confirmed {
        "MACD crossed its signal line in the same direction"
    } else {
        "no MACD signal-line cross"
    }
}

fn slope_phrase(slope: f64) -> &'static str {
    if slope > 0.0 {
        "rising"
    } else if slope < 0.0 {
        "falling"
    } else {
        "flat"
    }
}

// =============================================================================
// Rules
// =============================================================================

/// A named predicate that may turn a bar into a signal.
struct Rule {
    name: &'static str,
    evaluate: fn(&BarContext<'_>) -> Option<Signal>,
}

/// Evaluation order is priority order.
const RULES: &[Rule] = &[
    Rule {
        name: "bullish_crossover",
        evaluate: bullish_crossover,
    },
    Rule {
        name: "bearish_crossover",
        evaluate: bearish_crossover,
    },
    Rule {
        name: "overbought",
        evaluate: overbought,
    },
    Rule {
        name: "oversold",
        evaluate: oversold,
    },
];

fn bullish_crossover(ctx: &BarContext<'_>) -> Option<Signal> {
    let crossed = ctx.prev_ema_short <= ctx.prev_ema_long && ctx.ema_short > ctx.ema_long;
    if !crossed || ctx.rsi <= BULLISH_RSI {
        return None;
    }

    let breakdown = composite_confidence(&ConfidenceInputs {
        rsi: ctx.rsi,
        band: RsiBand::Upper {
            min: BULLISH_RSI,
            max: 100.0,
        },
        ema_spread_pct: ctx.ema_spread_pct,
        macd_confirmed: ctx.macd_bull_confirm,
        momentum: ctx.histogram_slope,
    });

    let reason = format!(
        "BUY SIGNAL: EMA 20 ({:.2}) crossed above EMA 50 ({:.2}), RSI {:.2} > {BULLISH_RSI}. \
         Corroboration: {}; MACD histogram {} ({:+.4}).",
        ctx.ema_short,
        ctx.ema_long,
        ctx.rsi,
        macd_phrase(ctx.macd_bull_confirm),
        slope_phrase(ctx.histogram_slope),
        ctx.histogram_slope,
    );

    Some(ctx.signal(SignalType::Long, breakdown.confidence, reason))
}

fn bearish_crossover(ctx: &BarContext<'_>) -> Option<Signal> {
    let crossed = ctx.prev_ema_short >= ctx.prev_ema_long && ctx.ema_short < ctx.ema_long;
    if !crossed || ctx.rsi >= BEARISH_RSI {
        return None;
    }

    let breakdown = composite_confidence(&ConfidenceInputs {
        rsi: ctx.rsi,
        band: RsiBand::Lower {
            min: 0.0,
            max: BEARISH_RSI,
        },
        ema_spread_pct: ctx.ema_spread_pct,
        macd_confirmed: ctx.macd_bear_confirm,
        momentum: -ctx.histogram_slope,
    });

    let reason = format!(
        "SELL SIGNAL: EMA 20 ({:.2}) crossed below EMA 50 ({:.2}), RSI {:.2} < {BEARISH_RSI}. \
         Corroboration: {}; MACD histogram {} ({:+.4}).",
        ctx.ema_short,
        ctx.ema_long,
        ctx.rsi,
        macd_phrase(ctx.macd_bear_confirm),
        slope_phrase(ctx.histogram_slope),
        ctx.histogram_slope,
    );

    Some(ctx.signal(SignalType::Short, breakdown.confidence, reason))
}

fn overbought(ctx: &BarContext<'_>) -> Option<Signal> {
    if ctx.rsi <= OVERBOUGHT_RSI {
        return None;
    }

    let breakdown = composite_confidence(&ConfidenceInputs {
        rsi: ctx.rsi,
        band: RsiBand::Upper {
            min: OVERBOUGHT_RSI,
            max: 100.0,
        },
        ema_spread_pct: 0.0,
        macd_confirmed: false,
        momentum: 0.0,
    });

    let reason = format!(
        "OVERBOUGHT WARNING: RSI = {:.2} > {OVERBOUGHT_RSI}. Price is stretched to the upside and \
         a pullback is likely; consider taking profit or waiting for a dip. \
         No crossover context, MACD not considered.",
        ctx.rsi,
    );

    Some(ctx.signal(SignalType::Reversal, breakdown.confidence, reason))
}

fn oversold(ctx: &BarContext<'_>) -> Option<Signal> {
    if ctx.rsi >= OVERSOLD_RSI {
        return None;
    }

    let breakdown = composite_confidence(&ConfidenceInputs {
        rsi: ctx.rsi,
        band: RsiBand::Lower {
            min: 0.0,
            max: OVERSOLD_RSI,
        },
        ema_spread_pct: 0.0,
        macd_confirmed: false,
        momentum: 0.0,
    });

    let reason = format!(
        "OVERSOLD OPPORTUNITY: RSI = {:.2} < {OVERSOLD_RSI}. Price is stretched to the downside and \
         a rebound is likely; this may be a buying opportunity. \
         No crossover context, MACD not considered.",
        ctx.rsi,
    );

    Some(ctx.signal(SignalType::Reversal, breakdown.confidence, reason))
}

// =============================================================================
// Engine
// =============================================================================

/// Stateless trend analyser. Every call is a pure function of its input bars.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalEngine;

impl SignalEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce the ordered signal list for `bars`.
    ///
    /// Fewer than [`MIN_BARS`] bars yields an empty list.
    pub fn analyze_trend(&self, bars: &[PriceBar]) -> Vec<Signal> {
        if bars.len() < MIN_BARS {
            warn!(
                bars = bars.len(),
                required = MIN_BARS,
                "not enough bars to analyse trend"
            );
            return Vec::new();
        }

        let indicators = TrendIndicators::compute(&indicators::closes(bars));
        let mut signals = Vec::new();

        for (i, bar) in bars.iter().enumerate().skip(EMA_LONG_PERIOD) {
            let Some(ctx) = BarContext::at(bar, &indicators, i) else {
                continue;
            };

            let fired = RULES
                .iter()
                .find_map(|rule| (rule.evaluate)(&ctx).map(|s| (rule.name, s)));

            if let Some((rule, signal)) = fired {
                debug!(
                    index = i,
                    rule,
                    signal_type = %signal.signal_type,
                    confidence = signal.confidence,
                    "signal emitted"
                );
                signals.push(signal);
            }
        }

        debug!(bars = bars.len(), signals = signals.len(), "trend analysis complete");
        signals
    }
}
