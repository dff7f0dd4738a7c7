//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for LLM backends with function calling,
//! allowing the dispatch loop to work with any of them without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let provider = GeminiProvider::from_env()?;
//! let completion = provider.complete(&messages, &declarations, &options).await?;
//! if let Some(call) = completion.first_tool_call() {
//!     // dispatch
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::schema::FunctionDeclaration;
use crate::tool::ToolCall;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 2048 }
fn default_top_p() -> f32 { 0.9 }

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

/// One part of a model response, in the order the model produced them
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePart {
    Text(String),
    FunctionCall(ToolCall),
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Response parts
    pub parts: Vec<ResponsePart>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Finish reason
    pub finish_reason: Option<FinishReason>,
}

impl Completion {
    /// Plain text completion (handy for tests and simple backends)
    pub fn text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            parts: vec![ResponsePart::Text(text.into())],
            model: model.into(),
            usage: None,
            finish_reason: Some(FinishReason::Stop),
        }
    }

    /// Function call requested in the *first* part, if any.
    ///
    /// Later parts are ignored, so at most one call is honoured per turn.
    pub fn first_tool_call(&self) -> Option<&ToolCall> {
        match self.parts.first() {
            Some(ResponsePart::FunctionCall(call)) => Some(call),
            _ => None,
        }
    }

    /// Concatenated text of all text parts
    pub fn content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::Text(t) => Some(t.as_str()),
                ResponsePart::FunctionCall(_) => None,
            })
            .collect()
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reason for completion finishing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Error,
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The dispatch loop works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Generate a completion from messages, offering `tools` for function
    /// calling (an empty slice offers none)
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[FunctionDeclaration],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.temperature, 0.7);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_only_first_part_is_inspected() {
        let mut completion = Completion::text("m", "Let me look that up.");
        completion.parts.push(ResponsePart::FunctionCall(ToolCall::new("get_market_overview")));
        assert!(completion.first_tool_call().is_none());
        assert_eq!(completion.content(), "Let me look that up.");

        completion.parts.reverse();
        assert_eq!(completion.first_tool_call().map(|c| c.name.as_str()), Some("get_market_overview"));
    }
}
