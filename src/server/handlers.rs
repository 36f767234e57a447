//! HTTP handlers for the Codesage API.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::{AppState, CachedResponse, ROUTES};
use crate::cache::cache_key;
use crate::types::requests::{AnalyzeRequest, ExplainRequest, InferRequest};
use crate::types::responses::{AnalyzeResponse, ExplainResponse, InferResponse};
use crate::CodesageError;

/// Unwraps a JSON body, turning extractor rejections into validation errors.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| CodesageError::validation(rejection.body_text()).into())
}

// ═══════════════════════════════════════════════════════════════════════════
// API
// ═══════════════════════════════════════════════════════════════════════════

/// `POST /api/explain`
pub async fn explain(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<ExplainResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    let req = body(payload)?;
    let model = req.validate(&state.config.gateway)?;

    let key = cache_key("explain", &[model.as_str(), req.code.as_str()]);
    if let Some(CachedResponse::Explain(cached)) = state.cache_get(&key) {
        tracing::info!(%request_id, model = %model, cached = true, "explain served");
        return Ok(Json(cached));
    }

    let explanation = state.gateway.explain(&model, &req.code).await?;
    let response = ExplainResponse { explanation };
    state.cache_put(key, CachedResponse::Explain(response.clone()));

    tracing::info!(
        %request_id,
        model = %model,
        cached = false,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "explain served"
    );
    Ok(Json(response))
}

/// `POST /api/analyze`
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let req = body(payload)?;
    req.validate()?;

    let key = cache_key("analyze", &[req.code.as_str()]);
    if let Some(CachedResponse::Analyze(cached)) = state.cache_get(&key) {
        tracing::info!(%request_id, cached = true, "analyze served");
        return Ok(Json(cached));
    }

    let response = AnalyzeResponse::from(state.analyzer.analyze(&req.code));
    state.cache_put(key, CachedResponse::Analyze(response.clone()));

    tracing::info!(
        %request_id,
        cached = false,
        findings = response.findings.len(),
        refactors = response.refactors.len(),
        "analyze served"
    );
    Ok(Json(response))
}

/// `POST /api/infer`
pub async fn infer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InferRequest>, JsonRejection>,
) -> Result<Json<InferResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    let req = body(payload)?;
    let model = req.validate(&state.config.gateway)?;

    let key = cache_key("infer", &[model.as_str(), req.prompt.as_str()]);
    if let Some(CachedResponse::Infer(cached)) = state.cache_get(&key) {
        tracing::info!(%request_id, model = %model, cached = true, "infer served");
        return Ok(Json(cached));
    }

    let text = state.gateway.complete(&model, &req.prompt).await?;
    let response = InferResponse { text };
    state.cache_put(key, CachedResponse::Infer(response.clone()));

    tracing::info!(
        %request_id,
        model = %model,
        cached = false,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "infer served"
    );
    Ok(Json(response))
}

// ═══════════════════════════════════════════════════════════════════════════
// Diagnostics
// ═══════════════════════════════════════════════════════════════════════════

/// Cache section of the health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHealth {
    pub enabled: bool,
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub credential_configured: bool,
    pub cache: CacheHealth,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache = match &state.cache {
        Some(cache) => {
            let stats = cache.stats();
            CacheHealth {
                enabled: true,
                size: stats.size,
                capacity: stats.capacity,
                hits: stats.hits,
                misses: stats.misses,
                hit_rate: stats.hit_rate(),
            }
        }
        None => CacheHealth {
            enabled: false,
            size: 0,
            capacity: 0,
            hits: 0,
            misses: 0,
            hit_rate: 0.0,
        },
    };

    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        credential_configured: state.config.gateway.token().is_some(),
        cache,
    })
}

/// Body of `GET /__routes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub routes: Vec<String>,
}

/// `GET /__routes`
pub async fn routes() -> Json<RoutesResponse> {
    let mut routes: Vec<String> = ROUTES.iter().map(|r| r.to_string()).collect();
    routes.sort();
    Json(RoutesResponse { routes })
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(crate::ui::INDEX_HTML)
}
