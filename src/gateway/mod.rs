//! Gateway to hosted language models.
//!
//! [`InferenceGateway`] is the seam the router depends on;
//! [`ChatCompletionsGateway`] is the HTTP implementation used in production.

mod base;
mod chat;

pub use base::{build_explain_prompt, InferenceGateway};
pub use chat::{parse_completion, ChatCompletionsGateway};
