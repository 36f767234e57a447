//! Integration tests for the HTTP API, driven over a real socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use codesage::gateway::InferenceGateway;
use codesage::server::{self, AppState};
use codesage::types::config::Config;
use codesage::types::requests::InferRequest;
use codesage::ui::{Action, ApiClient, ResultView, View};
use codesage::GatewayError;

/// In-process gateway that counts upstream calls.
#[derive(Default)]
struct CountingGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl InferenceGateway for CountingGateway {
    fn name(&self) -> &str {
        "counting"
    }

    fn resolve_model(&self, model_key: &str) -> Option<String> {
        Some(format!("upstream/{}", model_key))
    }

    async fn complete(&self, model_key: &str, prompt: &str) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {}", model_key, prompt.len()))
    }
}

async fn spawn(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server::router(Arc::new(state));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_with_fake() -> (SocketAddr, Arc<CountingGateway>) {
    let gateway = Arc::new(CountingGateway::default());
    let state = AppState::with_gateway(Config::default_config(), gateway.clone());
    (spawn(state).await, gateway)
}

async fn post(addr: SocketAddr, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{}{}", addr, path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn unreachable_config() -> Config {
    let mut config = Config::default_config();
    config.gateway.base_url = "http://127.0.0.1:1".to_string();
    config.gateway.api_token = Some("test-token".to_string());
    config.gateway.timeout_secs = 2;
    config
}

mod api_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_response_shape() {
        let (addr, gateway) = spawn_with_fake().await;
        let code = "def add(a,b): return a+b\ndef sum_two(x,y): return x+y\n";

        let (status, body) = post(addr, "/api/analyze", json!({ "code": code })).await;
        assert_eq!(status, 200);
        assert!(body["findings"].is_array());
        assert_eq!(body["refactors"].as_array().unwrap().len(), 1);
        assert_eq!(body["refactors"][0]["symbol"], "add & sum_two");
        assert!(body["refactors"][0]["suggestion"].is_string());
        assert_eq!(body["formatted"], code);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_explain_uses_default_model() {
        let (addr, gateway) = spawn_with_fake().await;

        let (status, body) = post(addr, "/api/explain", json!({ "code": "x = 1" })).await;
        assert_eq!(status, 200);
        assert!(body["explanation"].as_str().unwrap().starts_with("[qwen3]"));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_infer_skips_gateway() {
        let (addr, gateway) = spawn_with_fake().await;
        let request = json!({ "model": "deepseek-3.1", "prompt": "hello" });

        let (_, first) = post(addr, "/api/infer", request.clone()).await;
        let (status, second) = post(addr, "/api/infer", request).await;

        assert_eq!(status, 200);
        assert_eq!(first, second);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

        // A different model is a different cache entry.
        post(addr, "/api/infer", json!({ "model": "qwen3", "prompt": "hello" })).await;
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (addr, gateway) = spawn_with_fake().await;

        let (status, body) = post(addr, "/api/infer", json!({ "model": "qwen3" })).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "validation");

        let (status, body) = post(addr, "/api/explain", json!({ "code": "   " })).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "validation");

        let (status, body) = post(
            addr,
            "/api/infer",
            json!({ "model": "gpt-unknown", "prompt": "hi" }),
        )
        .await;
        assert_eq!(status, 400);
        assert!(body["detail"].as_str().unwrap().contains("gpt-unknown"));

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_validation_error() {
        let (addr, _) = spawn_with_fake().await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/analyze", addr))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "validation");
    }
}

mod diagnostics_tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let (addr, _) = spawn_with_fake().await;
        post(addr, "/api/analyze", json!({ "code": "x = 1" })).await;
        post(addr, "/api/analyze", json!({ "code": "x = 1" })).await;

        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["ok"], true);
        assert_eq!(body["cache"]["enabled"], true);
        assert_eq!(body["cache"]["size"], 1);
        assert_eq!(body["cache"]["hits"], 1);
    }

    #[tokio::test]
    async fn test_routes_listing() {
        let (addr, _) = spawn_with_fake().await;

        let body: Value = reqwest::get(format!("http://{}/__routes", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let routes: Vec<&str> = body["routes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_str().unwrap())
            .collect();
        assert!(routes.contains(&"/api/explain"));
        assert!(routes.contains(&"/api/analyze"));
        assert!(routes.contains(&"/api/infer"));
    }

    #[tokio::test]
    async fn test_index_serves_ui() {
        let (addr, _) = spawn_with_fake().await;

        let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let html = response.text().await.unwrap();
        assert!(html.contains("renderBoundary"));
    }
}

mod upstream_failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_upstream_is_502() {
        let addr = spawn(AppState::new(unreachable_config()).unwrap()).await;

        let (status, body) = post(
            addr,
            "/api/infer",
            json!({ "model": "qwen3", "prompt": "hello" }),
        )
        .await;

        assert_eq!(status, 502);
        assert_eq!(body["error"], "upstream");
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let addr = spawn(AppState::new(unreachable_config()).unwrap()).await;
        let request = json!({ "prompt": "hello" });

        post(addr, "/api/infer", request.clone()).await;
        post(addr, "/api/infer", request).await;

        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["cache"]["size"], 0);
    }

    #[tokio::test]
    async fn test_missing_token_is_configuration_error() {
        let mut config = unreachable_config();
        config.gateway.api_token = None;
        let addr = spawn(AppState::new(config).unwrap()).await;

        let (status, body) = post(addr, "/api/infer", json!({ "prompt": "hello" })).await;
        assert_eq!(status, 500);
        assert_eq!(body["error"], "configuration");
    }

    #[tokio::test]
    async fn test_error_view_replaces_previous_result() {
        let (good_addr, _) = spawn_with_fake().await;
        let bad_addr = spawn(AppState::new(unreachable_config()).unwrap()).await;
        let request = InferRequest::new("hello").with_model("qwen3");

        let mut view = ResultView::new();

        let good = ApiClient::new(format!("http://{}", good_addr), Duration::from_secs(5)).unwrap();
        view.begin(Action::Infer);
        view.finish(good.infer(&request).await);
        let previous = view.render();
        assert!(previous.contains("[qwen3]"));

        let bad = ApiClient::new(format!("http://{}", bad_addr), Duration::from_secs(5)).unwrap();
        view.begin(Action::Infer);
        view.finish(bad.infer(&request).await);

        assert!(view.current().is_error());
        let rendered = view.render();
        assert!(rendered.contains("upstream"));
        assert!(!rendered.contains("[qwen3]"));
        assert!(matches!(view.current(), View::Error(_)));
    }
}
