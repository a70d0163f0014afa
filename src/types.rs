// =============================================================================
// Shared types used across the trend signal engine
// =============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single daily OHLCV bar.
///
/// Callers supply bars in ascending timestamp order; the indicator and signal
/// core never re-sorts or validates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: u64,
}

impl PriceBar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Check the OHLC invariants: all prices finite and positive, `high` at
    /// or above both open and close, `low` at or below both.
    ///
    /// Returns a description of the first violated rule.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} is below max(open, close) {}",
                self.high,
                self.open.max(self.close)
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} is above min(open, close) {}",
                self.low,
                self.open.min(self.close)
            ));
        }
        Ok(())
    }
}

/// Discrete trading signal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Long,
    Short,
    Reversal,
    Hold,
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
            Self::Reversal => write!(f, "REVERSAL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// A trading signal emitted for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub signal_type: SignalType,
    /// Composite confidence in `[0, 0.98]`; emitted signals land in
    /// `[0.5, 0.98]`.
    pub confidence: f64,
    pub reason: String,
    /// Close price of the bar that triggered the signal.
    pub price: f64,
}
