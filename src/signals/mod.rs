// =============================================================================
// Signals Module
// =============================================================================
//
// Rule-based signal pipeline on top of the indicator library:
// - Composite confidence scoring (RSI band, EMA spread, MACD, momentum)
// - Priority-ordered crossover / reversal rules
// - Last-bar market sentiment summary

pub mod confidence;
pub mod engine;
pub mod sentiment;

pub use engine::SignalEngine;
pub use sentiment::get_market_sentiment;
