// =============================================================================
// Composite Confidence: Weighted blend of normalised indicator evidence
// =============================================================================
//
//   rsi_component      = position of RSI inside its threshold band, [0, 1]
//   ema_component      = |EMA20 - EMA50| / |EMA50| / 2%, clipped to [0, 1]
//   macd_component     = 1 if the MACD line crossed its signal line, else 0
//   momentum_component = |histogram slope| / 0.1, clipped to [0, 1]
//
//   score      = 0.55 * rsi + 0.25 * ema + 0.15 * macd + 0.05 * momentum
//   confidence = clip(0.5 + 0.48 * score, 0, 0.98)
//
// Because score is in [0, 1] the confidence of any emitted signal lies in
// [0.5, 0.98]; the 0.0 lower clip is kept regardless.
// =============================================================================

use serde::Serialize;

/// EMA spread at which the EMA component saturates.
const EMA_SPREAD_SCALE: f64 = 0.02;
/// Histogram slope at which the momentum component saturates.
const MOMENTUM_SCALE: f64 = 0.1;
const CONFIDENCE_FLOOR: f64 = 0.5;
const CONFIDENCE_RANGE: f64 = 0.48;
const CONFIDENCE_CAP: f64 = 0.98;

/// Relative weight of each evidence component.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfidenceWeights {
    pub rsi: f64,
    pub ema: f64,
    pub macd: f64,
    pub momentum: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            rsi: 0.55,
            ema: 0.25,
            macd: 0.15,
            momentum: 0.05,
        }
    }
}

/// The RSI band a rule fired in, with its normalisation direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RsiBand {
    /// Higher RSI is stronger evidence, e.g. `[55, 100]` for a long entry.
    Upper { min: f64, max: f64 },
    /// Lower RSI is stronger evidence, e.g. `[0, 45]` for a short entry.
    Lower { min: f64, max: f64 },
}

impl RsiBand {
    /// Normalised position of `rsi` inside the band, clipped to `[0, 1]`.
    pub fn position(&self, rsi: f64) -> f64 {
        match *self {
            Self::Upper { min, max } => clip01((rsi - min) / (max - min)),
            Self::Lower { min, max } => clip01((max - rsi) / (max - min)),
        }
    }
}

/// Raw evidence for one signal.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    pub rsi: f64,
    pub band: RsiBand,
    /// Absolute EMA20/EMA50 spread as a fraction of EMA50; 0 without
    /// crossover context.
    pub ema_spread_pct: f64,
    pub macd_confirmed: bool,
    /// Histogram slope signed in the signal's direction.
    pub momentum: f64,
}

/// Per-component breakdown of a composite confidence score.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConfidenceBreakdown {
    pub rsi_component: f64,
    pub ema_component: f64,
    pub macd_component: f64,
    pub momentum_component: f64,
    pub score: f64,
    pub confidence: f64,
}

/// Score `inputs` with the default weights.
pub fn composite_confidence(inputs: &ConfidenceInputs) -> ConfidenceBreakdown {
    weighted_confidence(inputs, &ConfidenceWeights::default())
}

/// Score `inputs` with explicit `weights`.
pub fn weighted_confidence(
    inputs: &ConfidenceInputs,
    weights: &ConfidenceWeights,
) -> ConfidenceBreakdown {
    let rsi_component = inputs.band.position(inputs.rsi);
    let ema_component = clip01(inputs.ema_spread_pct / EMA_SPREAD_SCALE);
    let macd_component = if inputs.macd_confirmed { 1.0 } else { 0.0 };
    let momentum_component = clip01(inputs.momentum.abs() / MOMENTUM_SCALE);

    let score = weights.rsi * rsi_component
        + weights.ema * ema_component
        + weights.macd * macd_component
        + weights.momentum * momentum_component;

    let confidence = (CONFIDENCE_FLOOR + CONFIDENCE_RANGE * score).clamp(0.0, CONFIDENCE_CAP);

    ConfidenceBreakdown {
        rsi_component,
        ema_component,
        macd_component,
        momentum_component,
        score,
        confidence,
    }
}

fn clip01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}
