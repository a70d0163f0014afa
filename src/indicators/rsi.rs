// =============================================================================
// Relative Strength Index (RSI): Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1: For each index i >= 1, split the change close[i] - close[i-1] into
//          gain = max(0, Δ) and loss = max(0, -Δ).
// Step 2: Accumulate gains / losses for 1 <= i < period; at i = period - 1
//          divide both sums by `period` to seed the averages and emit the
//          first value.
// Step 3: For i >= period apply Wilder's smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + loss) / period
// Step 4: RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS), and exactly 100 when avg_loss == 0.
//
// Note the seed divides by `period` although only `period - 1` changes have
// been observed by index `period - 1`.
// =============================================================================

use super::IndicatorSeries;

/// Compute the RSI series for the given `closes` and `period`.
///
/// The output is index-aligned with `closes`. Index 0 is always undefined;
/// the first defined value sits at `period - 1`. Periods below 2 have no
/// warm-up window to seed from and yield an all-`None` series.
pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    if period < 2 {
        return vec![None; closes.len()];
    }

    let period_f = period as f64;
    let mut result = Vec::with_capacity(closes.len());
    let mut avg_gain = 0.0_f64;
    let mut avg_loss = 0.0_f64;

    for (i, &close) in closes.iter().enumerate() {
        if i == 0 {
            result.push(None);
            continue;
        }

        let change = close - closes[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i < period {
            avg_gain += gain;
            avg_loss += loss;
            if i == period - 1 {
                avg_gain /= period_f;
                avg_loss /= period_f;
                result.push(Some(rsi_from_averages(avg_gain, avg_loss)));
            } else {
                result.push(None);
            }
            continue;
        }

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
        result.push(Some(rsi_from_averages(avg_gain, avg_loss)));
    }

    result
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// No losses in the window is the limit case RS → ∞, reported as 100.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}
