//! Corpos de requisição aceitos pela API do Codesage.

use serde::{Deserialize, Serialize};

use crate::types::config::GatewayConfig;
use crate::{CodesageError, CodesageResult};

/// Corpo de `POST /api/explain`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplainRequest {
    /// Código a explicar.
    #[serde(default)]
    pub code: String,

    /// Chave do modelo (`qwen3`, `deepseek-3.1`). Ausente, usa o modelo padrão.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Corpo de `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Código a analisar.
    #[serde(default)]
    pub code: String,
}

/// Corpo de `POST /api/infer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferRequest {
    /// Chave do modelo. Ausente, usa o modelo padrão.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Prompt livre.
    #[serde(default)]
    pub prompt: String,
}

impl ExplainRequest {
    /// Cria uma nova requisição de explicação.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            model: None,
        }
    }

    /// Define a chave do modelo.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Valida o corpo e resolve a chave do modelo.
    pub fn validate(&self, gateway: &GatewayConfig) -> CodesageResult<String> {
        require_text("code", &self.code)?;
        resolve_model_key(self.model.as_deref(), gateway)
    }
}

impl AnalyzeRequest {
    /// Cria uma nova requisição de análise.
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Valida o corpo.
    pub fn validate(&self) -> CodesageResult<()> {
        require_text("code", &self.code)
    }
}

impl InferRequest {
    /// Cria uma nova requisição de inferência.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
        }
    }

    /// Define a chave do modelo.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Valida o corpo e resolve a chave do modelo.
    pub fn validate(&self, gateway: &GatewayConfig) -> CodesageResult<String> {
        require_text("prompt", &self.prompt)?;
        resolve_model_key(self.model.as_deref(), gateway)
    }
}

fn require_text(field: &str, value: &str) -> CodesageResult<()> {
    if value.trim().is_empty() {
        return Err(CodesageError::validation(format!(
            "field `{}` is required and must not be empty",
            field
        )));
    }
    Ok(())
}

/// Picks the requested model key, or the configured default when absent.
fn resolve_model_key(requested: Option<&str>, gateway: &GatewayConfig) -> CodesageResult<String> {
    let key = match requested {
        None => return Ok(gateway.default_model.clone()),
        Some(key) => key.trim(),
    };

    if key.is_empty() {
        return Err(CodesageError::validation("field `model` must not be empty"));
    }

    if !gateway.models.contains_key(key) {
        let known: Vec<&str> = gateway.models.keys().map(String::as_str).collect();
        return Err(CodesageError::validation(format!(
            "unknown model '{}' (expected one of: {})",
            key,
            known.join(", ")
        )));
    }

    Ok(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let req: InferRequest = serde_json::from_str("{}").unwrap();
        assert!(req.prompt.is_empty());
        assert!(req.model.is_none());
        assert!(req.validate(&GatewayConfig::default()).is_err());
    }

    #[test]
    fn test_blank_code_rejected() {
        let err = AnalyzeRequest::new("   \n\t").validate().unwrap_err();
        assert!(err.to_string().contains("code"));
    }

    #[test]
    fn test_model_defaults_when_absent() {
        let gateway = GatewayConfig::default();
        let model = ExplainRequest::new("x = 1").validate(&gateway).unwrap();
        assert_eq!(model, "qwen3");
    }

    #[test]
    fn test_model_validation() {
        let gateway = GatewayConfig::default();

        let ok = InferRequest::new("hi").with_model("deepseek-3.1");
        assert_eq!(ok.validate(&gateway).unwrap(), "deepseek-3.1");

        let unknown = InferRequest::new("hi").with_model("gpt-9");
        let err = unknown.validate(&gateway).unwrap_err();
        assert!(err.to_string().contains("gpt-9"));

        let blank = InferRequest::new("hi").with_model(" ");
        assert!(blank.validate(&gateway).is_err());
    }
}
