// =============================================================================
// Market Analysis: Technical snapshot, latest prediction, window sentiment
// =============================================================================
//
// Combines the indicator library and the signal engine into one report for a
// single symbol. Only the most recent `history_limit` bars are considered.
// Undefined indicators are reported as `null`; nothing is substituted.
// =============================================================================

use anyhow::{ensure, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::indicators::bollinger::{calculate_bollinger, BollingerResult};
use crate::indicators::{closes, last_defined};
use crate::signals::engine::{SignalEngine, TrendIndicators};
use crate::signals::get_market_sentiment;
use crate::types::{PriceBar, SignalType};

/// Full analysis report for one symbol.
#[derive(Debug, Clone, Serialize)]
pub struct MarketAnalysis {
    pub symbol: String,
    pub bars_analyzed: usize,
    pub as_of: NaiveDateTime,
    pub technical: TechnicalSnapshot,
    pub prediction: PredictionSummary,
    pub sentiment: SentimentSummary,
}

/// Latest indicator readings with categorical labels.
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalSnapshot {
    pub rsi: Option<f64>,
    pub rsi_signal: &'static str,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub macd_trend: &'static str,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema_trend: &'static str,
    pub bollinger: Option<BollingerResult>,
    pub bb_position: &'static str,
    pub volume_ratio: Option<f64>,
    pub volume_signal: &'static str,
    pub price_change_pct: f64,
    pub momentum: &'static str,
}

/// The most recent engine signal, or a HOLD placeholder.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    pub signal_type: SignalType,
    /// Confidence as a percentage.
    pub confidence: f64,
    pub reasoning: String,
    pub price: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
    pub signals_in_window: usize,
    pub signal_strength: f64,
    pub risk_level: &'static str,
}

/// Window-level trend and volatility.
#[derive(Debug, Clone, Serialize)]
pub struct SentimentSummary {
    pub short_term_trend: f64,
    pub medium_term_trend: f64,
    pub overall: &'static str,
    pub volatility: f64,
    pub trend_strength: &'static str,
    pub summary: String,
}

/// Analyse the most recent `history_limit` bars of `bars`.
pub fn analyze_market(symbol: &str, bars: &[PriceBar], history_limit: usize) -> Result<MarketAnalysis> {
    ensure!(!bars.is_empty(), "no price bars supplied for {symbol}");

    let window = &bars[bars.len().saturating_sub(history_limit.max(1))..];
    let closes = closes(window);
    let indicators = TrendIndicators::compute(&closes);

    let technical = technical_snapshot(window, &closes, &indicators);
    let prediction = prediction_summary(window, &technical);
    let sentiment = sentiment_summary(window, &closes);

    debug!(
        symbol,
        bars = window.len(),
        signal = %prediction.signal_type,
        "market analysis complete"
    );

    Ok(MarketAnalysis {
        symbol: symbol.to_string(),
        bars_analyzed: window.len(),
        as_of: window[window.len() - 1].timestamp,
        technical,
        prediction,
        sentiment,
    })
}

// =============================================================================
// Technical snapshot
// =============================================================================

fn technical_snapshot(
    window: &[PriceBar],
    closes: &[f64],
    ind: &TrendIndicators,
) -> TechnicalSnapshot {
    let rsi = last_defined(&ind.rsi);
    let macd = last_defined(&ind.macd.macd_line);
    let macd_signal = last_defined(&ind.macd.signal_line);
    let macd_histogram = last_defined(&ind.macd.histogram);
    let ema20 = last_defined(&ind.ema_short);
    let ema50 = last_defined(&ind.ema_long);

    let last_close = closes[closes.len() - 1];
    let bollinger = calculate_bollinger(closes, 2.0);
    let bb_position = match &bollinger {
        Some(bb) if last_close > bb.upper => "ABOVE_UPPER",
        Some(bb) if last_close < bb.lower => "BELOW_LOWER",
        _ => "WITHIN_BANDS",
    };

    let avg_volume = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
    let last_volume = window[window.len() - 1].volume as f64;
    let volume_ratio = (avg_volume > 0.0).then(|| last_volume / avg_volume);

    let price_change_pct = (last_close - closes[0]) / closes[0] * 100.0;

    TechnicalSnapshot {
        rsi,
        rsi_signal: rsi_label(rsi),
        macd,
        macd_signal,
        macd_histogram,
        macd_trend: macd_trend(macd, macd_signal, macd_histogram),
        ema20,
        ema50,
        ema_trend: ema_trend(ema20, ema50),
        bollinger,
        bb_position,
        volume_ratio,
        volume_signal: volume_label(volume_ratio),
        price_change_pct,
        momentum: momentum_label(price_change_pct),
    }
}

fn rsi_label(rsi: Option<f64>) -> &'static str {
    match rsi {
        Some(v) if v > 70.0 => "OVERBOUGHT",
        Some(v) if v < 30.0 => "OVERSOLD",
        _ => "NEUTRAL",
    }
}

fn macd_trend(macd: Option<f64>, signal: Option<f64>, hist: Option<f64>) -> &'static str {
    match (macd, signal, hist) {
        (Some(m), Some(s), Some(h)) if m > s && h > 0.0 => "BULLISH",
        (Some(m), Some(s), Some(h)) if m < s && h < 0.0 => "BEARISH",
        _ => "NEUTRAL",
    }
}

fn ema_trend(ema20: Option<f64>, ema50: Option<f64>) -> &'static str {
    match (ema20, ema50) {
        (Some(a), Some(b)) if a > b => "BULLISH",
        (Some(a), Some(b)) if a < b => "BEARISH",
        _ => "NEUTRAL",
    }
}

fn volume_label(ratio: Option<f64>) -> &'static str {
    match ratio {
        Some(r) if r > 1.5 => "HIGH_VOLUME",
        Some(r) if r < 0.5 => "LOW_VOLUME",
        _ => "NORMAL_VOLUME",
    }
}

fn momentum_label(change_pct: f64) -> &'static str {
    if change_pct > 5.0 {
        "STRONG_BULLISH"
    } else if change_pct > 1.0 {
        "BULLISH"
    } else if change_pct < -5.0 {
        "STRONG_BEARISH"
    } else if change_pct < -1.0 {
        "BEARISH"
    } else {
        "NEUTRAL"
    }
}

// =============================================================================
// Prediction
// =============================================================================

fn prediction_summary(window: &[PriceBar], technical: &TechnicalSnapshot) -> PredictionSummary {
    let signals = SignalEngine::new().analyze_trend(window);
    let signal_strength = signal_strength(technical);

    let mut summary = PredictionSummary {
        signal_type: SignalType::Hold,
        confidence: 50.0,
        reasoning: "No signal in the analysis window".to_string(),
        price: None,
        timestamp: None,
        signals_in_window: signals.len(),
        signal_strength,
        risk_level: risk_level(signal_strength),
    };

    match signals.last() {
        Some(latest) => {
            summary.signal_type = latest.signal_type;
            summary.confidence = latest.confidence * 100.0;
            summary.reasoning = latest.reason.clone();
            summary.price = Some(latest.price);
            summary.timestamp = Some(latest.timestamp);
        }
        None if window.len() < crate::signals::engine::MIN_BARS => {
            summary.reasoning = "Insufficient data for analysis".to_string();
        }
        None => {}
    }

    summary
}

fn signal_strength(t: &TechnicalSnapshot) -> f64 {
    let mut strength: f64 = 50.0;
    if matches!(t.rsi, Some(v) if !(30.0..=70.0).contains(&v)) {
        strength += 20.0;
    }
    if matches!(t.macd, Some(m) if m.abs() > 1.0) {
        strength += 15.0;
    }
    if t.ema_trend != "NEUTRAL" {
        strength += 15.0;
    }
    strength.min(100.0)
}

fn risk_level(strength: f64) -> &'static str {
    if strength > 80.0 {
        "LOW"
    } else if strength > 60.0 {
        "MEDIUM"
    } else {
        "HIGH"
    }
}

// =============================================================================
// Sentiment
// =============================================================================

fn sentiment_summary(window: &[PriceBar], closes: &[f64]) -> SentimentSummary {
    let short_term_trend = trailing_change_pct(closes, 5);
    let medium_term_trend = trailing_change_pct(closes, 20);

    SentimentSummary {
        short_term_trend,
        medium_term_trend,
        overall: overall_sentiment(short_term_trend, medium_term_trend),
        volatility: volatility(closes),
        trend_strength: trend_strength(short_term_trend, medium_term_trend),
        summary: get_market_sentiment(window),
    }
}

/// Percentage change from `lookback` bars before the last one (or the first
/// bar when the window is shorter).
fn trailing_change_pct(closes: &[f64], lookback: usize) -> f64 {
    let last = closes[closes.len() - 1];
    let base = closes[closes.len().saturating_sub(lookback + 1)];
    (last - base) / base * 100.0
}

fn overall_sentiment(short: f64, medium: f64) -> &'static str {
    if short > 2.0 && medium > 2.0 {
        "STRONG_BULLISH"
    } else if short > 0.0 && medium > 0.0 {
        "BULLISH"
    } else if short < -2.0 && medium < -2.0 {
        "STRONG_BEARISH"
    } else if short < 0.0 && medium < 0.0 {
        "BEARISH"
    } else {
        "NEUTRAL"
    }
}

/// Coefficient of variation of the closes (population σ / mean).
fn volatility(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let n = closes.len() as f64;
    let mean = closes.iter().sum::<f64>() / n;
    let variance = closes.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() / mean
}

fn trend_strength(short: f64, medium: f64) -> &'static str {
    let avg = ((short + medium) / 2.0).abs();
    if avg > 5.0 {
        "STRONG"
    } else if avg > 2.0 {
        "MODERATE"
    } else {
        "WEAK"
    }
}
