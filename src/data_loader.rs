// =============================================================================
// CSV Bar Loader: Yahoo-style daily OHLCV files
// =============================================================================
//
// Accepted layouts:
//   Date,Open,High,Low,Close,Adj Close,Volume   (volume in column 7)
//   Date,Open,High,Low,Close,Volume             (volume in column 6)
//
// Loading is lenient. Rows that cannot be used are counted and skipped:
// fewer than six fields, unparseable dates or prices, and non-positive
// prices. High and low are widened to enclose open and close. An
// unparseable volume reads as 0. The result is sorted ascending by
// timestamp so newest-first exports load the right way round.
// =============================================================================

use std::io::Read;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::{debug, info};

use crate::types::PriceBar;

const MIN_FIELDS: usize = 6;

/// One raw CSV row, positionally deserialised.
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    /// Adj Close in the 7-column layout, volume in the 6-column one.
    #[serde(default)]
    sixth: Option<String>,
    #[serde(default)]
    seventh: Option<String>,
}

/// Bars recovered from a CSV source.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: Vec<PriceBar>,
    /// Data rows dropped as unusable (the header is not counted).
    pub skipped: usize,
}

/// Read Yahoo-style OHLCV rows from `source`.
///
/// Only I/O failures are errors; malformed rows are skipped.
pub fn load_csv<R: Read>(source: R) -> Result<LoadedBars> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut bars = Vec::new();
    let mut skipped = 0usize;

    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("failed to read CSV row {}", idx + 1));
            }
            Err(e) => {
                debug!(row = idx + 1, error = %e, "skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        if idx == 0 && is_header(&record) {
            continue;
        }

        match parse_row(&record) {
            Some(bar) => bars.push(bar),
            None => {
                debug!(row = idx + 1, "skipping invalid CSV row");
                skipped += 1;
            }
        }
    }

    bars.sort_by_key(|b| b.timestamp);

    info!(bars = bars.len(), skipped, "CSV bars loaded");
    Ok(LoadedBars { bars, skipped })
}

fn is_header(record: &csv::StringRecord) -> bool {
    record
        .get(0)
        .is_some_and(|first| first.eq_ignore_ascii_case("date"))
}

fn parse_row(record: &csv::StringRecord) -> Option<PriceBar> {
    if record.len() < MIN_FIELDS {
        return None;
    }
    let row: CsvRow = record.deserialize(None).ok()?;

    let timestamp = parse_timestamp(&row.date)?;
    if [row.open, row.high, row.low, row.close]
        .iter()
        .any(|p| !p.is_finite() || *p <= 0.0)
    {
        return None;
    }

    let volume_field = if record.len() > MIN_FIELDS {
        row.seventh
    } else {
        row.sixth
    };
    let volume = volume_field.as_deref().map(parse_volume).unwrap_or(0);

    let high = row.high.max(row.open.max(row.close));
    let low = row.low.min(row.open.min(row.close));

    Some(PriceBar::new(timestamp, row.open, high, low, row.close, volume))
}

/// `YYYY-MM-DD`, or a date-time with `T` or a space separator. A date-time
/// that fails to parse falls back to midnight of its leading date.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.contains(':') || raw.contains(' ') {
        if let Ok(ts) = raw.replacen(' ', "T", 1).parse::<NaiveDateTime>() {
            return Some(ts);
        }
        let date = raw.get(..10)?.parse::<NaiveDate>().ok()?;
        return Some(date.and_time(NaiveTime::MIN));
    }
    raw.parse::<NaiveDate>()
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_volume(raw: &str) -> u64 {
    raw.parse::<u64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0)
}
