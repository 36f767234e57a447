//! Gateway for OpenAI-compatible `/chat/completions` endpoints.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::base::InferenceGateway;
use crate::types::config::GatewayConfig;
use crate::types::errors::GatewayError;
use crate::CodesageResult;

/// Upstream error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 2000;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<MessageContent>,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Gateway backed by the Hugging Face router (or any compatible API).
pub struct ChatCompletionsGateway {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    models: BTreeMap<String, String>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatCompletionsGateway {
    /// Creates the gateway from the `[gateway]` section.
    pub fn from_config(config: &GatewayConfig) -> CodesageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_token: config.token().map(str::to_string),
            models: config.models.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether a credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_token.is_some()
    }

    async fn send(
        &self,
        token: &str,
        body: &ChatRequest<'_>,
    ) -> Result<reqwest::Response, GatewayError> {
        self.client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Network(describe_transport_error(&e)))
    }
}

#[async_trait]
impl InferenceGateway for ChatCompletionsGateway {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn resolve_model(&self, model_key: &str) -> Option<String> {
        self.models.get(model_key).cloned()
    }

    async fn complete(&self, model_key: &str, prompt: &str) -> Result<String, GatewayError> {
        let model = self
            .resolve_model(model_key)
            .ok_or_else(|| GatewayError::UnknownModel(model_key.to_string()))?;
        let token = self
            .api_token
            .as_deref()
            .ok_or(GatewayError::MissingCredential)?;

        let body = ChatRequest {
            model: &model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        tracing::debug!(model = %model, endpoint = %self.endpoint, "Calling hosted model");

        let mut response = self.send(token, &body).await?;

        // One immediate retry for transient overload, no backoff.
        if matches!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        ) {
            tracing::warn!(
                status = %response.status(),
                model = %model,
                "Upstream busy, retrying once"
            );
            response = self.send(token, &body).await?;
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(describe_transport_error(&e)))?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate(&text, MAX_ERROR_BODY),
            });
        }

        parse_completion(&text)
    }
}

/// Extracts `choices[0].message.content` from a completion body.
pub fn parse_completion(body: &str) -> Result<String, GatewayError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            GatewayError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

fn describe_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
