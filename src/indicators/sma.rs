// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// Arithmetic mean of the last `period` closes. The first `period - 1`
// positions are undefined.

use super::IndicatorSeries;

/// Compute the SMA series for `closes` over `period`.
///
/// The output has the same length as `closes`. A zero period yields an
/// all-`None` series.
pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut result = Vec::with_capacity(closes.len());
    let mut window_sum = 0.0;

    for (i, &close) in closes.iter().enumerate() {
        window_sum += close;
        if i >= period {
            window_sum -= closes[i - period];
        }
        if i + 1 < period {
            result.push(None);
        } else {
            result.push(Some(window_sum / period as f64));
        }
    }

    result
}
