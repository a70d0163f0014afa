// =============================================================================
// REST API Endpoints: Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Bars travel in the request body and
// nothing is persisted between requests. Bars are validated here, at the
// boundary; the indicator and signal core trusts its input.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{analyze_market, MarketAnalysis};
use crate::app_state::AppState;
use crate::data_generator::{BarGenerator, Pattern};
use crate::data_loader::load_csv;
use crate::indicators::{self, calculate_sma, IndicatorSeries};
use crate::runtime_config::RuntimeConfig;
use crate::signals::engine::{TrendIndicators, EMA_SHORT_PERIOD};
use crate::signals::get_market_sentiment;
use crate::types::{PriceBar, Signal, SignalType};

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/indicators", post(indicator_series))
        .route("/api/v1/signals", post(signals))
        .route("/api/v1/sentiment", post(sentiment))
        .route("/api/v1/analysis", post(analysis))
        .route("/api/v1/analysis/batch", post(analysis_batch))
        .route("/api/v1/bars/csv", post(csv_bars))
        .route("/api/v1/demo/:pattern", get(demo))
        .route("/api/v1/config", get(get_config).put(update_config))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Errors
// =============================================================================

/// JSON error response `{ "error": ... }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Reject bars that break the OHLC invariants or go back in time.
fn validate_bars(bars: &[PriceBar]) -> Result<(), ApiError> {
    for (i, bar) in bars.iter().enumerate() {
        if let Err(reason) = bar.validate() {
            warn!(index = i, %reason, "rejected invalid bar");
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("bar {i}: {reason}"),
            ));
        }
        if i > 0 && bar.timestamp < bars[i - 1].timestamp {
            warn!(index = i, "rejected out-of-order bar");
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("bar {i}: timestamp precedes the previous bar"),
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    analyses_served: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        analyses_served: state.analyses_served(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Indicators
// =============================================================================

#[derive(Deserialize)]
struct BarsRequest {
    bars: Vec<PriceBar>,
}

#[derive(Serialize)]
struct MacdSeries {
    macd_line: IndicatorSeries,
    signal_line: IndicatorSeries,
    histogram: IndicatorSeries,
}

#[derive(Serialize)]
struct IndicatorResponse {
    timestamps: Vec<chrono::NaiveDateTime>,
    sma20: IndicatorSeries,
    ema20: IndicatorSeries,
    ema50: IndicatorSeries,
    rsi14: IndicatorSeries,
    macd: MacdSeries,
}

async fn indicator_series(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BarsRequest>,
) -> Result<Json<IndicatorResponse>, ApiError> {
    validate_bars(&req.bars)?;
    state.record_analysis();

    let closes = indicators::closes(&req.bars);
    let ind = TrendIndicators::compute(&closes);

    Ok(Json(IndicatorResponse {
        timestamps: req.bars.iter().map(|b| b.timestamp).collect(),
        sma20: calculate_sma(&closes, EMA_SHORT_PERIOD),
        ema20: ind.ema_short,
        ema50: ind.ema_long,
        rsi14: ind.rsi,
        macd: MacdSeries {
            macd_line: ind.macd.macd_line,
            signal_line: ind.macd.signal_line,
            histogram: ind.macd.histogram,
        },
    }))
}

// =============================================================================
// Signals & sentiment
// =============================================================================

/// Optional filters on `POST /api/v1/signals`.
#[derive(Deserialize)]
struct SignalsQuery {
    /// Keep signals at or above this confidence, in `[0, 1]`.
    min_confidence: Option<f64>,
    /// Keep only this signal type (`LONG`, `SHORT`, `REVERSAL`, `HOLD`).
    #[serde(rename = "type")]
    signal_type: Option<SignalType>,
}

/// Per-type counts over every signal the engine emitted, before filtering.
#[derive(Debug, Default, Serialize, PartialEq)]
struct SignalStats {
    total: usize,
    long: usize,
    short: usize,
    reversal: usize,
    hold: usize,
}

impl SignalStats {
    fn from_signals(signals: &[Signal]) -> Self {
        let mut stats = Self {
            total: signals.len(),
            ..Self::default()
        };
        for s in signals {
            match s.signal_type {
                SignalType::Long => stats.long += 1,
                SignalType::Short => stats.short += 1,
                SignalType::Reversal => stats.reversal += 1,
                SignalType::Hold => stats.hold += 1,
            }
        }
        stats
    }
}

#[derive(Serialize)]
struct SignalsResponse {
    count: usize,
    by_type: SignalStats,
    signals: Vec<Signal>,
}

async fn signals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignalsQuery>,
    Json(req): Json<BarsRequest>,
) -> Result<Json<SignalsResponse>, ApiError> {
    if let Some(min) = query.min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(ApiError::new(
                StatusCode::BAD_REQUEST,
                "min_confidence must be within [0, 1]",
            ));
        }
    }
    validate_bars(&req.bars)?;
    state.record_analysis();

    let all = state.engine.analyze_trend(&req.bars);
    let by_type = SignalStats::from_signals(&all);

    let signals: Vec<Signal> = all
        .into_iter()
        .filter(|s| query.min_confidence.map_or(true, |min| s.confidence >= min))
        .filter(|s| query.signal_type.map_or(true, |ty| s.signal_type == ty))
        .collect();

    info!(
        bars = req.bars.len(),
        emitted = by_type.total,
        returned = signals.len(),
        "signals computed"
    );

    Ok(Json(SignalsResponse {
        count: signals.len(),
        by_type,
        signals,
    }))
}

#[derive(Serialize)]
struct SentimentResponse {
    sentiment: String,
}

async fn sentiment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BarsRequest>,
) -> Result<Json<SentimentResponse>, ApiError> {
    validate_bars(&req.bars)?;
    state.record_analysis();

    Ok(Json(SentimentResponse {
        sentiment: get_market_sentiment(&req.bars),
    }))
}

// =============================================================================
// Market analysis
// =============================================================================

#[derive(Deserialize)]
struct AnalysisRequest {
    symbol: String,
    bars: Vec<PriceBar>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<MarketAnalysis>, ApiError> {
    validate_bars(&req.bars)?;
    state.record_analysis();

    let history_limit = state.config().history_limit;
    let report = analyze_market(&req.symbol, &req.bars, history_limit)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    info!(symbol = %req.symbol, signal = %report.prediction.signal_type, "market analysis served");
    Ok(Json(report))
}

#[derive(Deserialize)]
struct BatchRequest {
    series: Vec<AnalysisRequest>,
}

#[derive(Serialize)]
struct BatchItem {
    symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<MarketAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct BatchResponse {
    results: Vec<BatchItem>,
}

/// Analyse several independent series, one blocking task per series.
///
/// Results come back in request order. A series that fails validation or
/// analysis reports its error without failing the others.
async fn analysis_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let config = state.config();
    if req.series.len() > config.max_batch_series {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!(
                "batch of {} series exceeds the limit of {}",
                req.series.len(),
                config.max_batch_series
            ),
        ));
    }

    let handles: Vec<_> = req
        .series
        .into_iter()
        .map(|item| {
            let history_limit = config.history_limit;
            tokio::task::spawn_blocking(move || {
                let outcome = validate_bars(&item.bars)
                    .map_err(|e| e.message)
                    .and_then(|()| {
                        analyze_market(&item.symbol, &item.bars, history_limit)
                            .map_err(|e| e.to_string())
                    });
                (item.symbol, outcome)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let (symbol, outcome) = handle.await.map_err(|e| {
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("analysis task failed: {e}"),
            )
        })?;
        state.record_analysis();
        results.push(match outcome {
            Ok(analysis) => BatchItem {
                symbol,
                analysis: Some(analysis),
                error: None,
            },
            Err(error) => BatchItem {
                symbol,
                analysis: None,
                error: Some(error),
            },
        });
    }

    info!(series = results.len(), "batch analysis served");
    Ok(Json(BatchResponse { results }))
}

// =============================================================================
// Demo data
// =============================================================================

#[derive(Deserialize)]
struct DemoQuery {
    days: Option<usize>,
    start_price: Option<f64>,
    seed: Option<u64>,
}

#[derive(Serialize)]
struct DemoResponse {
    pattern: Pattern,
    seed: u64,
    bars: Vec<PriceBar>,
    signals: Vec<Signal>,
    sentiment: String,
}

async fn demo(
    State(state): State<Arc<AppState>>,
    Path(pattern): Path<String>,
    Query(query): Query<DemoQuery>,
) -> Result<Json<DemoResponse>, ApiError> {
    let pattern: Pattern = pattern
        .parse()
        .map_err(|e: anyhow::Error| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    let config = state.config();
    let days = query.days.unwrap_or(config.demo_days).min(config.max_demo_days);
    let start_price = query.start_price.unwrap_or(config.demo_start_price);
    if !start_price.is_finite() || start_price <= 0.0 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "start_price must be a positive number",
        ));
    }
    let seed = query.seed.unwrap_or(config.default_seed);

    let start = chrono::Utc::now().date_naive().and_time(NaiveTime::MIN)
        - Duration::days(days as i64);
    let bars = BarGenerator::new(seed).generate(pattern, days, start_price, start);
    let signals = state.engine.analyze_trend(&bars);
    let sentiment = get_market_sentiment(&bars);
    state.record_analysis();

    info!(%pattern, days, seed, signals = signals.len(), "demo series generated");

    Ok(Json(DemoResponse {
        pattern,
        seed,
        bars,
        signals,
        sentiment,
    }))
}

// =============================================================================
// CSV upload
// =============================================================================

#[derive(Serialize)]
struct CsvBarsResponse {
    skipped: usize,
    bars: Vec<PriceBar>,
    count: usize,
    signals: Vec<Signal>,
    sentiment: String,
}

/// Parse a Yahoo-style CSV body into bars and run the engine over them.
async fn csv_bars(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<CsvBarsResponse>, ApiError> {
    let loaded = load_csv(body.as_bytes())
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("{e:#}")))?;
    if loaded.bars.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            format!("no usable rows in CSV ({} skipped)", loaded.skipped),
        ));
    }
    validate_bars(&loaded.bars)?;
    state.record_analysis();

    let signals = state.engine.analyze_trend(&loaded.bars);
    let sentiment = get_market_sentiment(&loaded.bars);

    info!(
        bars = loaded.bars.len(),
        skipped = loaded.skipped,
        signals = signals.len(),
        "CSV bars analysed"
    );

    Ok(Json(CsvBarsResponse {
        skipped: loaded.skipped,
        bars: loaded.bars,
        count: signals.len(),
        signals,
        sentiment,
    }))
}

// =============================================================================
// Runtime config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config())
}

#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    history_limit: Option<usize>,
    #[serde(default)]
    max_demo_days: Option<usize>,
    #[serde(default)]
    demo_days: Option<usize>,
    #[serde(default)]
    demo_start_price: Option<f64>,
    #[serde(default)]
    default_seed: Option<u64>,
    #[serde(default)]
    max_batch_series: Option<usize>,
}

#[derive(Serialize)]
struct ConfigUpdateResponse {
    config: RuntimeConfig,
    changes: Vec<String>,
    persisted: bool,
}

/// Apply a partial update. The merged config is validated before it
/// replaces the live one; `bind_addr` is not changeable at runtime.
async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<ConfigUpdateResponse>, ApiError> {
    let mut candidate = state.config();
    let mut changes = Vec::new();

    macro_rules! apply_field {
        ($field:ident) => {
            if let Some(val) = update.$field {
                if candidate.$field != val {
                    changes.push(format!(
                        "{}: {} -> {}",
                        stringify!($field),
                        candidate.$field,
                        val
                    ));
                    candidate.$field = val;
                }
            }
        };
    }

    apply_field!(history_limit);
    apply_field!(max_demo_days);
    apply_field!(demo_days);
    apply_field!(demo_start_price);
    apply_field!(default_seed);
    apply_field!(max_batch_series);

    candidate
        .validate()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut persisted = false;
    if !changes.is_empty() {
        *state.runtime_config.write() = candidate.clone();
        info!(changes = ?changes, "Runtime config updated");

        if let Some(path) = &state.config_path {
            match candidate.save(path) {
                Ok(()) => persisted = true,
                Err(e) => warn!(error = %e, "Failed to save runtime config to disk"),
            }
        }
    }

    Ok(Json(ConfigUpdateResponse {
        config: candidate,
        changes,
        persisted,
    }))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::bars_from_closes;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(Arc::new(AppState::new(RuntimeConfig::default())))
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn breakout_bars() -> Vec<PriceBar> {
        let mut closes = vec![100.0; 50];
        let mut p = 100.0;
        for _ in 0..10 {
            p *= 1.03;
            closes.push(p);
        }
        bars_from_closes(&closes)
    }

    #[tokio::test]
    async fn health_is_public() {
        let req = Request::get("/api/v1/health").body(Body::empty()).unwrap();
        let (status, json) = call(app(), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn indicators_are_aligned_with_nulls() {
        let bars = bars_from_closes(&[100.0; 30]);
        let (status, json) =
            call(app(), post("/api/v1/indicators", serde_json::json!({ "bars": bars }))).await;
        assert_eq!(status, StatusCode::OK);
        let ema20 = json["ema20"].as_array().unwrap();
        assert_eq!(ema20.len(), 30);
        assert!(ema20[18].is_null());
        assert_eq!(ema20[19], 100.0);
        assert!(json["ema50"].as_array().unwrap().iter().all(|v| v.is_null()));
        assert_eq!(json["macd"]["histogram"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn signals_endpoint_returns_long_first() {
        let (status, json) = call(
            app(),
            post("/api/v1/signals", serde_json::json!({ "bars": breakout_bars() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 10);
        assert_eq!(json["signals"][0]["signal_type"], "LONG");
        assert_eq!(json["signals"][1]["signal_type"], "REVERSAL");
    }

    #[tokio::test]
    async fn short_input_yields_empty_signals_and_fixed_sentiment() {
        let bars = bars_from_closes(&[100.0; 10]);
        let (_, json) =
            call(app(), post("/api/v1/signals", serde_json::json!({ "bars": bars }))).await;
        assert_eq!(json["count"], 0);

        let (_, json) =
            call(app(), post("/api/v1/sentiment", serde_json::json!({ "bars": bars }))).await;
        assert_eq!(json["sentiment"], crate::signals::sentiment::INSUFFICIENT_DATA);
    }

    #[tokio::test]
    async fn invalid_bar_is_unprocessable() {
        let mut bars = bars_from_closes(&[100.0; 5]);
        bars[3].low = 200.0;
        let (status, json) =
            call(app(), post("/api/v1/signals", serde_json::json!({ "bars": bars }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().starts_with("bar 3"));
    }

    #[tokio::test]
    async fn out_of_order_bars_are_unprocessable() {
        let mut bars = bars_from_closes(&[100.0; 5]);
        bars.swap(1, 2);
        let (status, _) =
            call(app(), post("/api/v1/sentiment", serde_json::json!({ "bars": bars }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn analysis_of_empty_series_is_bad_request() {
        let (status, json) = call(
            app(),
            post("/api/v1/analysis", serde_json::json!({ "symbol": "VNM", "bars": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("VNM"));
    }

    #[tokio::test]
    async fn analysis_reports_latest_signal() {
        let (status, json) = call(
            app(),
            post(
                "/api/v1/analysis",
                serde_json::json!({ "symbol": "HPG", "bars": breakout_bars() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["symbol"], "HPG");
        assert_eq!(json["prediction"]["signal_type"], "REVERSAL");
        assert_eq!(json["technical"]["ema_trend"], "BULLISH");
    }

    #[tokio::test]
    async fn batch_keeps_order_and_isolates_failures() {
        let body = serde_json::json!({
            "series": [
                { "symbol": "AAA", "bars": breakout_bars() },
                { "symbol": "BBB", "bars": [] },
                { "symbol": "CCC", "bars": bars_from_closes(&[100.0; 60]) },
            ]
        });
        let (status, json) = call(app(), post("/api/v1/analysis/batch", body)).await;
        assert_eq!(status, StatusCode::OK);
        let results = json["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0]["symbol"], "AAA");
        assert!(results[0]["analysis"].is_object());
        assert_eq!(results[1]["symbol"], "BBB");
        assert!(results[1]["error"].is_string());
        assert!(results[1].get("analysis").is_none());
        assert_eq!(results[2]["analysis"]["bars_analyzed"], 60);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected() {
        let state = Arc::new(AppState::new(RuntimeConfig {
            max_batch_series: 1,
            ..RuntimeConfig::default()
        }));
        let body = serde_json::json!({
            "series": [
                { "symbol": "A", "bars": [] },
                { "symbol": "B", "bars": [] },
            ]
        });
        let (status, _) = call(router(state), post("/api/v1/analysis/batch", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn demo_is_deterministic_per_seed() {
        let uri = "/api/v1/demo/bullish?days=80&seed=7";
        let (status, first) = call(app(), Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = call(app(), Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(first["bars"].as_array().unwrap().len(), 80);
        assert_eq!(first["pattern"], "bullish");
        assert_eq!(first["signals"], second["signals"]);
    }

    #[tokio::test]
    async fn demo_days_are_capped() {
        let state = Arc::new(AppState::new(RuntimeConfig {
            max_demo_days: 60,
            ..RuntimeConfig::default()
        }));
        let req = Request::get("/api/v1/demo/random?days=5000")
            .body(Body::empty())
            .unwrap();
        let (_, json) = call(router(state), req).await;
        assert_eq!(json["bars"].as_array().unwrap().len(), 60);
    }

    #[tokio::test]
    async fn unknown_demo_pattern_is_bad_request() {
        let req = Request::get("/api/v1/demo/moonshot").body(Body::empty()).unwrap();
        let (status, json) = call(app(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("moonshot"));
    }

    #[tokio::test]
    async fn signals_report_type_counts_and_filter() {
        let body = serde_json::json!({ "bars": breakout_bars() });
        let (status, json) = call(app(), post("/api/v1/signals?type=LONG", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 1);
        assert_eq!(json["signals"][0]["signal_type"], "LONG");
        assert_eq!(json["by_type"]["total"], 10);
        assert_eq!(json["by_type"]["long"], 1);
        assert_eq!(json["by_type"]["reversal"], 9);
        assert_eq!(json["by_type"]["short"], 0);

        // Reversals at RSI 100 score 0.764; the long scores higher.
        let (_, json) = call(app(), post("/api/v1/signals?min_confidence=0.8", body)).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["by_type"]["total"], 10);
    }

    #[tokio::test]
    async fn out_of_range_min_confidence_is_bad_request() {
        let body = serde_json::json!({ "bars": breakout_bars() });
        let (status, _) = call(app(), post("/api/v1/signals?min_confidence=1.5", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    fn post_text(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "text/csv")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn csv_upload_is_sorted_and_analysed() {
        // Newest first, with one broken row.
        let mut csv = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
        let bars = breakout_bars();
        for bar in bars.iter().rev() {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{}\n",
                bar.timestamp.date(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.close,
                bar.volume
            ));
        }
        csv.push_str("2030-01-01,oops,1,1,1,1,1\n");

        let (status, json) = call(app(), post_text("/api/v1/bars/csv", csv)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["bars"].as_array().unwrap().len(), 60);
        assert_eq!(json["count"], 10);
        assert_eq!(json["signals"][0]["signal_type"], "LONG");
    }

    #[tokio::test]
    async fn csv_without_usable_rows_is_bad_request() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\nbad,row\n".to_string();
        let (status, json) = call(app(), post_text("/api/v1/bars/csv", csv)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("1 skipped"));
    }

    fn put(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn config_update_applies_and_persists() {
        let dir = std::env::temp_dir().join(format!("trendsignal-api-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("runtime_config.json");

        let state = Arc::new(
            AppState::new(RuntimeConfig::default()).with_config_path(path.clone()),
        );

        let (status, json) = call(
            router(state.clone()),
            put("/api/v1/config", serde_json::json!({ "history_limit": 60 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["config"]["history_limit"], 60);
        assert_eq!(json["changes"].as_array().unwrap().len(), 1);
        assert_eq!(json["persisted"], true);
        assert_eq!(state.config().history_limit, 60);
        assert_eq!(RuntimeConfig::load(&path).unwrap().history_limit, 60);

        let req = Request::get("/api/v1/config").body(Body::empty()).unwrap();
        let (_, json) = call(router(state), req).await;
        assert_eq!(json["history_limit"], 60);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn invalid_config_update_is_rejected_and_not_applied() {
        let state = Arc::new(AppState::new(RuntimeConfig::default()));
        let (status, _) = call(
            router(state.clone()),
            put("/api/v1/config", serde_json::json!({ "max_batch_series": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(state.config().max_batch_series, 32);
    }

    #[tokio::test]
    async fn config_update_without_path_stays_in_memory() {
        let state = Arc::new(AppState::new(RuntimeConfig::default()));
        let (_, json) = call(
            router(state.clone()),
            put("/api/v1/config", serde_json::json!({ "default_seed": 7 })),
        )
        .await;
        assert_eq!(json["persisted"], false);
        assert_eq!(state.config().default_seed, 7);
    }
}
