//! Base trait for hosted-model gateways.

use async_trait::async_trait;

use crate::types::errors::GatewayError;

/// Instruction prepended to code sent to `explain`.
const EXPLAIN_INSTRUCTIONS: &str = "You are a senior code reviewer. Add detailed comments and best-practice signposts. \
Focus on naming, cohesion, error handling, typing, complexity, and DRY. \
Return concise markdown bullet points followed by a commented code block.";

/// A hosted language model reachable over the network.
///
/// The router only talks to this trait, so tests can swap the real HTTP
/// gateway for an in-process fake.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Gateway name, for logs.
    fn name(&self) -> &str;

    /// Maps a model key (`qwen3`) to the upstream model identifier.
    fn resolve_model(&self, model_key: &str) -> Option<String>;

    /// Sends `prompt` to the model behind `model_key` and returns the generated text.
    async fn complete(&self, model_key: &str, prompt: &str) -> Result<String, GatewayError>;

    /// Asks the model to explain and annotate `code`.
    async fn explain(&self, model_key: &str, code: &str) -> Result<String, GatewayError> {
        self.complete(model_key, &build_explain_prompt(code)).await
    }
}

/// Builds the prompt used by `explain`.
pub fn build_explain_prompt(code: &str) -> String {
    let mut prompt = String::with_capacity(EXPLAIN_INSTRUCTIONS.len() + code.len() + 8);
    prompt.push_str(EXPLAIN_INSTRUCTIONS);
    prompt.push_str("\n\nCODE:\n");
    prompt.push_str(code);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoGateway;

    #[async_trait]
    impl InferenceGateway for EchoGateway {
        fn name(&self) -> &str {
            "echo"
        }

        fn resolve_model(&self, model_key: &str) -> Option<String> {
            Some(model_key.to_string())
        }

        async fn complete(&self, model_key: &str, prompt: &str) -> Result<String, GatewayError> {
            Ok(format!("{}:{}", model_key, prompt))
        }
    }

    #[test]
    fn test_build_explain_prompt() {
        let prompt = build_explain_prompt("def f(): pass");

        assert!(prompt.starts_with("You are a senior code reviewer."));
        assert!(prompt.ends_with("CODE:\ndef f(): pass"));
    }

    #[tokio::test]
    async fn test_explain_wraps_code_in_prompt() {
        let text = EchoGateway.explain("qwen3", "x = 1").await.unwrap();

        assert!(text.starts_with("qwen3:You are a senior code reviewer."));
        assert!(text.ends_with("x = 1"));
    }
}
