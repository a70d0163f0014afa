// =============================================================================
// Market Sentiment: one-line summary of the latest bar
// =============================================================================
//
// Trend direction comes from EMA20 vs EMA50 on the last bar (with the
// percentage spread), followed by an RSI regime label:
//   RSI > 70 => overbought, RSI < 30 => oversold,
//   RSI > 50 => positive momentum, otherwise neutral.

use crate::indicators::{calculate_ema, calculate_rsi, closes, last_defined};
use crate::signals::engine::{EMA_LONG_PERIOD, EMA_SHORT_PERIOD, MIN_BARS, RSI_PERIOD};
use crate::types::PriceBar;

pub const INSUFFICIENT_DATA: &str = "Insufficient data to analyse market sentiment";
pub const INDETERMINATE: &str = "Market sentiment could not be determined";

/// Describe the market state at the last bar of `bars`.
pub fn get_market_sentiment(bars: &[PriceBar]) -> String {
    if bars.len() < MIN_BARS {
        return INSUFFICIENT_DATA.to_string();
    }

    let closes = closes(bars);
    let ema_short = last_defined(&calculate_ema(&closes, EMA_SHORT_PERIOD));
    let ema_long = last_defined(&calculate_ema(&closes, EMA_LONG_PERIOD));
    let rsi = last_defined(&calculate_rsi(&closes, RSI_PERIOD));

    let (Some(ema_short), Some(ema_long), Some(rsi)) = (ema_short, ema_long, rsi) else {
        return INDETERMINATE.to_string();
    };

    let trend = if ema_short > ema_long {
        let spread = (ema_short - ema_long) / ema_long * 100.0;
        format!("UPTREND (EMA 20: {ema_short:.2} > EMA 50: {ema_long:.2}, spread: +{spread:.2}%).")
    } else {
        let spread = (ema_long - ema_short) / ema_long * 100.0;
        format!("DOWNTREND (EMA 20: {ema_short:.2} <= EMA 50: {ema_long:.2}, spread: -{spread:.2}%).")
    };

    let regime = if rsi > 70.0 {
        format!("OVERBOUGHT (RSI: {rsi:.2}) - watch for a pullback")
    } else if rsi < 30.0 {
        format!("OVERSOLD (RSI: {rsi:.2}) - potential buying opportunity")
    } else if rsi > 50.0 {
        format!("POSITIVE MOMENTUM (RSI: {rsi:.2}) - market is healthy")
    } else {
        format!("NEUTRAL (RSI: {rsi:.2}) - wait for a clearer signal")
    };

    format!("{trend} {regime}")
}
