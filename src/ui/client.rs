//! HTTP client used by the terminal UI.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::view::{Action, View};
use crate::types::requests::{AnalyzeRequest, ExplainRequest, InferRequest};
use crate::types::responses::{AnalyzeResponse, ErrorResponse, ExplainResponse, InferResponse};
use crate::CodesageResult;

/// Talks to a running Codesage API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CodesageResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Base URL requests go to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Calls `/api/explain` and turns the outcome into a view.
    pub async fn explain(&self, request: &ExplainRequest) -> View {
        match self.post::<_, ExplainResponse>(Action::Explain, request).await {
            Ok(response) => View::Explanation(response.explanation),
            Err(message) => View::Error(message),
        }
    }

    /// Calls `/api/analyze` and turns the outcome into a view.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> View {
        match self.post::<_, AnalyzeResponse>(Action::Analyze, request).await {
            Ok(response) => View::Analysis(response),
            Err(message) => View::Error(message),
        }
    }

    /// Calls `/api/infer` and turns the outcome into a view.
    pub async fn infer(&self, request: &InferRequest) -> View {
        match self.post::<_, InferResponse>(Action::Infer, request).await {
            Ok(response) => View::Text(response.text),
            Err(message) => View::Error(message),
        }
    }

    /// Posts `body`; failures come back as display text.
    async fn post<B, R>(&self, action: Action, body: &B) -> Result<R, String>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/api/{}", self.base_url, action);
        tracing::debug!(url = %url, "Sending request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("could not reach {}: {}", self.base_url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|e| format!("unexpected response from server: {}", e));
        }

        Err(match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(err) => describe_error(&err),
            Err(_) => format!("server returned {}: {}", status, text.trim()),
        })
    }
}

/// One-line description of an API error body.
pub fn describe_error(err: &ErrorResponse) -> String {
    match err.status {
        Some(status) => format!("{} error (upstream {}): {}", err.error, status, err.detail),
        None => format!("{} error: {}", err.error, err.detail),
    }
}
