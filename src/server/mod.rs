//! HTTP API of Codesage.
//!
//! Exposes the three user-facing operations plus diagnostics:
//!
//! - `POST /api/explain` - model-written review of a code snippet
//! - `POST /api/analyze` - local heuristic analysis
//! - `POST /api/infer` - free-form prompt to a hosted model
//! - `GET /health`, `GET /__routes` - diagnostics
//! - `GET /` - the browser UI
//!
//! Results are memoized in a [`TtlCache`] keyed by a hash of the inputs.
//!
//! ## Example
//!
//! ```ignore
//! use codesage::server;
//! use codesage::types::config::Config;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load_or_default().with_env_overrides();
//!     server::serve(config).await.unwrap();
//! }
//! ```

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{CacheHealth, HealthResponse, RoutesResponse};

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::analyzer::Analyzer;
use crate::cache::TtlCache;
use crate::gateway::{ChatCompletionsGateway, InferenceGateway};
use crate::types::config::Config;
use crate::types::responses::{AnalyzeResponse, ExplainResponse, InferResponse};
use crate::{CodesageError, CodesageResult};

/// Every path the router serves.
pub const ROUTES: &[&str] = &[
    "/",
    "/__routes",
    "/api/analyze",
    "/api/explain",
    "/api/infer",
    "/health",
];

/// A memoized API result.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Explain(ExplainResponse),
    Analyze(AnalyzeResponse),
    Infer(InferResponse),
}

/// State shared by all handlers.
pub struct AppState {
    pub config: Config,
    pub analyzer: Analyzer,
    pub gateway: Arc<dyn InferenceGateway>,
    pub cache: Option<TtlCache<String, CachedResponse>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds state with the production HTTP gateway.
    pub fn new(config: Config) -> CodesageResult<Self> {
        let gateway = ChatCompletionsGateway::from_config(&config.gateway)?;
        Ok(Self::with_gateway(config, Arc::new(gateway)))
    }

    /// Builds state around an arbitrary gateway.
    pub fn with_gateway(config: Config, gateway: Arc<dyn InferenceGateway>) -> Self {
        let cache = config.cache.enabled.then(|| {
            TtlCache::new(
                config.cache.capacity,
                Duration::from_secs(config.cache.ttl_secs),
            )
        });

        Self {
            analyzer: Analyzer::new(config.analyzer.clone()),
            gateway,
            cache,
            started_at: Utc::now(),
            config,
        }
    }

    /// Cached value for `key`, if the cache is enabled and holds a live entry.
    pub fn cache_get(&self, key: &str) -> Option<CachedResponse> {
        self.cache.as_ref()?.get(key)
    }

    /// Stores a value when the cache is enabled.
    pub fn cache_put(&self, key: String, value: CachedResponse) {
        if let Some(cache) = &self.cache {
            cache.put(key, value);
        }
    }
}

/// Builds the axum router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/__routes", get(handlers::routes))
        .route("/api/explain", post(handlers::explain))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/infer", post(handlers::infer))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: Config) -> CodesageResult<()> {
    let bind = config.server.bind.clone();
    let state = Arc::new(AppState::new(config)?);

    if state.config.gateway.token().is_none() {
        tracing::warn!("HF_API_TOKEN not set. /api/infer and /api/explain will fail until configured.");
    }

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, routes = ?ROUTES, "Codesage API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CodesageError::Server(e.to_string()))?;

    tracing::info!("Codesage API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_disabled() {
        let mut config = Config::default_config();
        config.cache.enabled = false;
        let state = AppState::new(config).unwrap();

        state.cache_put(
            "k".to_string(),
            CachedResponse::Infer(InferResponse {
                text: "t".to_string(),
            }),
        );
        assert!(state.cache_get("k").is_none());
    }

    #[test]
    fn test_cache_enabled_uses_config() {
        let mut config = Config::default_config();
        config.cache.capacity = 3;
        let state = AppState::new(config).unwrap();

        let cache = state.cache.as_ref().unwrap();
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.ttl(), Duration::from_secs(45));
    }

    #[test]
    fn test_huge_ttl_config_does_not_panic() {
        let mut config = Config::default_config();
        config.cache.ttl_secs = u64::MAX;
        let state = AppState::new(config).unwrap();

        state.cache_put(
            "k".to_string(),
            CachedResponse::Infer(InferResponse {
                text: "t".to_string(),
            }),
        );
        assert!(state.cache_get("k").is_some());
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Must not panic on a value that is not a valid header.
        let _ = cors_layer(&["http://ok.test".to_string(), "bad\norigin".to_string()]);
    }
}
