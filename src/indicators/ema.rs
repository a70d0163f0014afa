// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = (close_t - EMA_{t-1}) * multiplier + EMA_{t-1}
//
// The first defined value, at index `period - 1`, is seeded with the SMA of
// the first `period` closes.
// =============================================================================

use super::IndicatorSeries;

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// The output is index-aligned with `closes`: positions before `period - 1`
/// are `None`. A zero period yields an all-`None` series.
pub fn calculate_ema(closes: &[f64], period: usize) -> IndicatorSeries {
    ema_of_defined(&closes.iter().map(|&c| Some(c)).collect::<Vec<_>>(), period)
}

/// EMA over the *defined* entries of `values`.
///
/// Undefined entries pass through as `None` and do not count toward the
/// seeding window: the seed is the mean of the first `period` defined values,
/// wherever they sit in the series. After seeding, each defined value
/// advances the recurrence from the previous smoothed value.
pub fn ema_of_defined(values: &[Option<f64>], period: usize) -> IndicatorSeries {
    if period == 0 {
        return vec![None; values.len()];
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let mut result = Vec::with_capacity(values.len());
    let mut seed_sum = 0.0;
    let mut seen = 0usize;
    let mut prev: Option<f64> = None;

    for value in values {
        let Some(v) = *value else {
            result.push(None);
            continue;
        };

        match prev {
            Some(prev_ema) => {
                let ema = (v - prev_ema) * multiplier + prev_ema;
                prev = Some(ema);
                result.push(Some(ema));
            }
            None => {
                seed_sum += v;
                seen += 1;
                if seen == period {
                    let seed = seed_sum / period as f64;
                    prev = Some(seed);
                    result.push(Some(seed));
                } else {
                    result.push(None);
                }
            }
        }
    }

    result
}
