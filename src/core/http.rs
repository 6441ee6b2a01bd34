//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::analysis::{DemandAggregator, LifecycleAnalyzer, SeasonalityAnalyzer};
use crate::db::ProductStore;
use crate::error::{AnalysisError, Result as AnalysisResult};
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub store: Option<Arc<dyn ProductStore>>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

/// Envelope returned by every analysis endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub analysis_data: Option<Value>,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "store_configured": state.store.is_some(),
        "service": "ecommerce-analytics"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Increment in-flight requests
    state.metrics.http_requests_in_flight.inc();

    // Process request
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    // Decrement in-flight requests
    state.metrics.http_requests_in_flight.dec();

    // Record metrics
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    // Log if error status
    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Deserialize)]
pub struct DemandQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LifecycleQuery {
    pub current_date: Option<String>,
}

fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::NotFound { .. } => StatusCode::NOT_FOUND,
        AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AnalysisError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn an analysis outcome into a response and record its metrics
fn respond<T: Serialize>(
    state: &AppState,
    analysis: &str,
    product_id: &str,
    started: Instant,
    outcome: AnalysisResult<T>,
) -> (StatusCode, Json<AnalysisResponse>) {
    let elapsed = started.elapsed();
    let outcome_label = match &outcome {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    state
        .metrics
        .observe_analysis(analysis, outcome_label, elapsed);

    let result = outcome.and_then(|data| {
        serde_json::to_value(data).map_err(|e| AnalysisError::Processing(e.to_string()))
    });

    match result {
        Ok(data) => (
            StatusCode::OK,
            Json(AnalysisResponse {
                success: true,
                message: format!("Analyzed {} for product '{}'", analysis, product_id),
                analysis_data: Some(json!({
                    "result": data,
                    "metrics": {
                        "computation_time": elapsed.as_secs_f64(),
                        "success": true
                    }
                })),
            }),
        ),
        Err(e) => {
            let message = match &e {
                AnalysisError::NotFound { .. } => format!("Product '{}' not found", product_id),
                other => format!("Error analyzing {}: {}", analysis, other),
            };
            (
                status_for(&e),
                Json(AnalysisResponse {
                    success: false,
                    message,
                    analysis_data: None,
                }),
            )
        }
    }
}

fn store_of(state: &AppState) -> Result<Arc<dyn ProductStore>, StatusCode> {
    state
        .store
        .clone()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

/// Monthly demand series for a product
async fn product_demand(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(params): Query<DemandQuery>,
) -> Result<(StatusCode, Json<AnalysisResponse>), StatusCode> {
    let store = store_of(&state)?;
    let started = Instant::now();
    let outcome = match (params.start_date, params.end_date) {
        (Some(start_date), Some(end_date)) => {
            DemandAggregator::new(store)
                .compute(&product_id, start_date, end_date)
                .await
        }
        (start_date, _) => {
            let missing = if start_date.is_none() { "start_date" } else { "end_date" };
            Err(AnalysisError::InvalidInput(format!(
                "{} query parameter is required",
                missing
            )))
        }
    };
    Ok(respond(&state, "demand", &product_id, started, outcome))
}

/// Month-of-year seasonality for a product
async fn product_seasonality(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<(StatusCode, Json<AnalysisResponse>), StatusCode> {
    let store = store_of(&state)?;
    let started = Instant::now();
    let outcome = SeasonalityAnalyzer::new(store).analyze(&product_id).await;
    Ok(respond(&state, "seasonality", &product_id, started, outcome))
}

/// Lifecycle stage for a product, as of `current_date` (defaults to now)
async fn product_lifecycle(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(params): Query<LifecycleQuery>,
) -> Result<(StatusCode, Json<AnalysisResponse>), StatusCode> {
    let store = store_of(&state)?;
    let started = Instant::now();
    let analyzer = LifecycleAnalyzer::new(store);
    let outcome = match params.current_date {
        Some(current_date) => analyzer.analyze(&product_id, current_date).await,
        None => analyzer.analyze(&product_id, chrono::Utc::now()).await,
    };
    Ok(respond(&state, "lifecycle", &product_id, started, outcome))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/products/{id}/demand", get(product_demand))
        .route("/api/products/{id}/seasonality", get(product_seasonality))
        .route("/api/products/{id}/lifecycle", get(product_lifecycle))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    store: Option<Arc<dyn ProductStore>>,
    metrics: Arc<Metrics>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        store,
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
