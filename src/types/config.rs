//! Configuration for Codesage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::CodesageResult;

/// Model key served by default.
pub const QWEN3: &str = "qwen3";

/// Second supported model key.
pub const DEEPSEEK31: &str = "deepseek-3.1";

/// Main configuration for Codesage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Hosted-model gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Heuristic analyzer settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origins allowed by CORS (the browser UI dev servers).
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://127.0.0.1:5173".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

/// Hosted-model gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token. Usually supplied through `HF_API_TOKEN` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Timeout for a single upstream call (in seconds).
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Model key used when a request omits one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Model key -> upstream model identifier.
    #[serde(default = "default_models")]
    pub models: BTreeMap<String, String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_gateway_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            default_model: default_model(),
            models: default_models(),
        }
    }
}

impl GatewayConfig {
    /// Returns the token if one is configured and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn default_base_url() -> String {
    "https://router.huggingface.co/v1".to_string()
}

fn default_gateway_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    512
}

fn default_model() -> String {
    QWEN3.to_string()
}

fn default_models() -> BTreeMap<String, String> {
    let mut models = BTreeMap::new();
    models.insert(
        QWEN3.to_string(),
        "Qwen/Qwen2.5-Coder-7B-Instruct".to_string(),
    );
    models.insert(
        DEEPSEEK31.to_string(),
        "deepseek-ai/DeepSeek-Coder-V2-Lite-Instruct".to_string(),
    );
    models
}

/// Heuristic analyzer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Lines longer than this (in characters) are reported.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Spaces substituted for each leading tab when formatting.
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,

    /// Include the formatted rendering in results.
    #[serde(default = "default_true")]
    pub format: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            indent_width: default_indent_width(),
            format: true,
        }
    }
}

fn default_max_line_length() -> usize {
    120
}

fn default_indent_width() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// TTL cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cache capacity (number of entries).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time to live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> usize {
    200
}

fn default_cache_ttl() -> u64 {
    45
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> CodesageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CodesageResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            gateway: GatewayConfig::default(),
            analyzer: AnalyzerConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("codesage.toml").unwrap_or_else(|_| Self::default_config())
    }

    /// Applies overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides using `lookup` as the environment.
    ///
    /// Blank values are ignored.
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("HF_API_TOKEN") {
            self.gateway.api_token = Some(token);
        }
        if let Some(base) = get("HF_API_BASE") {
            self.gateway.base_url = base;
        }
        if let Some(model) = get("QWEN3_MODEL") {
            self.gateway.models.insert(QWEN3.to_string(), model);
        }
        if let Some(model) = get("DEEPSEEK31_MODEL") {
            self.gateway.models.insert(DEEPSEEK31.to_string(), model);
        }
        if let Some(origin) = get("CORS_ORIGIN") {
            if !self.server.cors_origins.contains(&origin) {
                self.server.cors_origins.insert(0, origin);
            }
        }
        if let Some(bind) = get("CODESAGE_BIND") {
            self.server.bind = bind;
        }

        self
    }

    /// Checks cross-field constraints the serde defaults cannot express.
    pub fn validate(&self) -> CodesageResult<()> {
        use crate::CodesageError;

        if !self.gateway.models.contains_key(&self.gateway.default_model) {
            return Err(CodesageError::config(format!(
                "default_model '{}' is not listed in [gateway.models]",
                self.gateway.default_model
            )));
        }
        if self.analyzer.max_line_length == 0 {
            return Err(CodesageError::config("max_line_length must be at least 1"));
        }
        if self.cache.ttl_secs == 0 && self.cache.enabled {
            return Err(CodesageError::config(
                "cache ttl_secs must be positive when the cache is enabled",
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_service() {
        let config = Config::default_config();
        assert_eq!(config.cache.ttl_secs, 45);
        assert_eq!(config.cache.capacity, 200);
        assert_eq!(config.analyzer.max_line_length, 120);
        assert_eq!(config.gateway.default_model, QWEN3);
        assert_eq!(config.gateway.models.len(), 2);
        assert!(config.gateway.token().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            ttl_secs = 10

            [analyzer]
            max_line_length = 80
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.ttl_secs, 10);
        assert_eq!(config.cache.capacity, 200);
        assert_eq!(config.analyzer.max_line_length, 80);
        assert_eq!(config.analyzer.indent_width, 4);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default_config().with_overrides_from(|name| match name {
            "HF_API_TOKEN" => Some("hf_secret".to_string()),
            "QWEN3_MODEL" => Some("Qwen/Other".to_string()),
            "CORS_ORIGIN" => Some("http://example.test".to_string()),
            "HF_API_BASE" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.gateway.token(), Some("hf_secret"));
        assert_eq!(config.gateway.models[QWEN3], "Qwen/Other");
        assert_eq!(config.server.cors_origins[0], "http://example.test");
        // Blank override ignored
        assert_eq!(config.gateway.base_url, "https://router.huggingface.co/v1");
    }

    #[test]
    fn test_validate_rejects_unknown_default_model() {
        let mut config = Config::default_config();
        config.gateway.default_model = "missing".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codesage.toml");

        let mut config = Config::default_config();
        config.cache.capacity = 7;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 7);
        assert_eq!(loaded.gateway.models, config.gateway.models);
    }
}
