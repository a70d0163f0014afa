// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
//   macd_line   = EMA(fast) - EMA(slow)            where both are defined
//   signal_line = EMA(signal) over the defined macd_line values only
//   histogram   = macd_line - signal_line          where both are defined
//
// The signal line's warm-up counts defined macd_line values, not absolute
// index positions, so it first appears `signal - 1` bars after the first
// defined macd_line value.

use super::ema::{calculate_ema, ema_of_defined};
use super::IndicatorSeries;

/// The three aligned MACD output series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdResult {
    pub macd_line: IndicatorSeries,
    pub signal_line: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

/// Compute MACD(`fast`, `slow`, `signal`) over `closes`.
pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdResult {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd_line: IndicatorSeries = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema_of_defined(&macd_line, signal);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn macd_series_are_aligned() {
        let closes = wavy(80);
        let macd = calculate_macd(&closes, 12, 26, 9);
        assert_eq!(macd.macd_line.len(), 80);
        assert_eq!(macd.signal_line.len(), 80);
        assert_eq!(macd.histogram.len(), 80);
    }

    #[test]
    fn macd_line_starts_at_slow_warm_up() {
        let macd = calculate_macd(&wavy(80), 12, 26, 9);
        assert!(macd.macd_line[..25].iter().all(Option::is_none));
        assert!(macd.macd_line[25..].iter().all(Option::is_some));
    }

    #[test]
    fn signal_line_counts_only_defined_macd_values() {
        // First macd value at 25, ninth defined one at 33.
        let macd = calculate_macd(&wavy(80), 12, 26, 9);
        assert!(macd.signal_line[..33].iter().all(Option::is_none));
        assert!(macd.signal_line[33].is_some());

        let seed: f64 = macd.macd_line[25..34].iter().map(|v| v.unwrap()).sum::<f64>() / 9.0;
        assert!((macd.signal_line[33].unwrap() - seed).abs() < 1e-10);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let macd = calculate_macd(&wavy(80), 12, 26, 9);
        for i in 0..80 {
            match (macd.macd_line[i], macd.signal_line[i]) {
                (Some(m), Some(s)) => {
                    assert!((macd.histogram[i].unwrap() - (m - s)).abs() < 1e-12)
                }
                _ => assert!(macd.histogram[i].is_none()),
            }
        }
    }

    #[test]
    fn constant_series_has_zero_macd() {
        let macd = calculate_macd(&vec![50.0; 60], 12, 26, 9);
        for v in macd.macd_line.iter().flatten() {
            assert!(v.abs() < 1e-9);
        }
        for v in macd.histogram.iter().flatten() {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn short_input_is_all_undefined() {
        let macd = calculate_macd(&wavy(20), 12, 26, 9);
        assert!(macd.macd_line.iter().all(Option::is_none));
        assert!(macd.histogram.iter().all(Option::is_none));
    }
}
