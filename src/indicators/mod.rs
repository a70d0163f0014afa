// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator recurrences over a close-price slice.
// Every function returns an `IndicatorSeries` index-aligned with its input;
// warm-up positions hold `None` so that "not computed yet" is never mistaken
// for a real zero.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdResult};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use crate::types::PriceBar;

/// One value per input bar; `None` while the indicator is warming up.
pub type IndicatorSeries = Vec<Option<f64>>;

/// Extract the close prices of `bars`, preserving order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// The last element of `series` if it is defined.
pub fn last_defined(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
