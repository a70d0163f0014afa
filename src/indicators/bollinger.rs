// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (mean), an upper band (mean + k*σ),
// and a lower band (mean - k*σ). The Band Width is the normalised distance:
// width = (upper - lower) / middle * 100.
//
// The market snapshot computes the bands over its whole analysis window
// using the population standard deviation.

use serde::Serialize;

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Serialize)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub width: f64,
}

/// Calculate Bollinger Bands over every value in `closes`.
///
/// Returns `None` when `closes` is empty or the middle band is zero.
pub fn calculate_bollinger(closes: &[f64], num_std: f64) -> Option<BollingerResult> {
    if closes.is_empty() {
        return None;
    }

    let n = closes.len() as f64;
    let middle = closes.iter().sum::<f64>() / n;
    if middle == 0.0 {
        return None;
    }

    let variance = closes.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let upper = middle + num_std * std_dev;
    let lower = middle - num_std * std_dev;
    let width = (upper - lower) / middle * 100.0;

    width.is_finite().then_some(BollingerResult {
        upper,
        middle,
        lower,
        width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bollinger_basic() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let bb = calculate_bollinger(&closes, 2.0).unwrap();
        assert!((bb.middle - 10.5).abs() < 1e-12);
        assert!(bb.upper > bb.middle);
        assert!(bb.lower < bb.middle);
        assert!(bb.width > 0.0);
    }

    #[test]
    fn bollinger_empty() {
        assert!(calculate_bollinger(&[], 2.0).is_none());
    }

    #[test]
    fn bollinger_flat() {
        let bb = calculate_bollinger(&[100.0; 20], 2.0).unwrap();
        assert!(bb.width.abs() < 1e-10);
        assert_eq!(bb.upper, bb.lower);
    }
}
