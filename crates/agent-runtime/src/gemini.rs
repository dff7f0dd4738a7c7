//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` for Google's Generative Language API
//! with native function calling.

use std::collections::HashMap;
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ResponsePart, TokenUsage},
    schema::FunctionDeclaration,
    tool::ToolCall,
};
use async_trait::async_trait;
use serde_json::{Value, json};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (sent as `x-goog-api-key`)
    pub api_key: String,

    /// Models endpoint
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.into(),
            timeout_secs: 120,
        }
    }

    /// Read `GOOGLE_API_KEY`, falling back to `GEMINI_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = ["GOOGLE_API_KEY", "GEMINI_API_KEY"]
            .into_iter()
            .filter_map(&lookup)
            .find(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::Config("GOOGLE_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Some(base) = lookup("GEMINI_API_BASE") {
            config.base_url = base;
        }
        Ok(config)
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(GeminiConfig::from_env()?)
    }

    fn api_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.config.base_url.trim_end_matches('/'), model)
    }

    /// Convert agent messages into Gemini `contents` plus the system instruction
    fn convert_messages(messages: &[Message]) -> (Vec<Value>, Option<Value>) {
        let mut contents = Vec::new();
        let mut system = None;

        for m in messages {
            match m.role {
                Role::System => {
                    system = Some(json!({ "parts": [{ "text": m.content }] }));
                }
                Role::User => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": m.content }]
                })),
                Role::Assistant => {
                    if let Some(call) = &m.tool_call {
                        contents.push(json!({
                            "role": "model",
                            "parts": [{ "functionCall": { "name": call.name, "args": call.arguments } }]
                        }));
                    } else if !m.content.is_empty() {
                        contents.push(json!({
                            "role": "model",
                            "parts": [{ "text": m.content }]
                        }));
                    }
                }
                Role::Tool => contents.push(json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "name": m.name.clone().unwrap_or_default(),
                            "response": { "content": m.content }
                        }
                    }]
                })),
            }
        }

        (contents, system)
    }

    /// Gemini rejects object parameters without properties, so argument-less
    /// functions are declared without `parameters`
    fn convert_declaration(decl: &FunctionDeclaration) -> Value {
        let has_properties = decl.parameters["properties"]
            .as_object()
            .is_some_and(|p| !p.is_empty());

        let mut value = json!({
            "name": decl.name,
            "description": decl.description,
        });
        if has_properties {
            value["parameters"] = decl.parameters.clone();
        }
        value
    }

    fn build_request_body(
        messages: &[Message],
        tools: &[FunctionDeclaration],
        options: &GenerationOptions,
    ) -> Value {
        let (contents, system) = Self::convert_messages(messages);

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "temperature": options.temperature,
                "topP": options.top_p,
                "maxOutputTokens": options.max_tokens,
            }
        });

        if let Some(system) = system {
            body["systemInstruction"] = system;
        }

        if !tools.is_empty() {
            let declarations: Vec<_> = tools.iter().map(Self::convert_declaration).collect();
            body["tools"] = json!([{ "functionDeclarations": declarations }]);
        }

        body
    }

    fn parse_response(json: &Value, model: &str) -> Result<Completion> {
        let Some(candidate) = json["candidates"].as_array().and_then(|c| c.first()) else {
            let reason = json["promptFeedback"]["blockReason"]
                .as_str()
                .unwrap_or("no candidates in response");
            return Err(AgentError::Provider(reason.to_string()));
        };

        let mut parts = Vec::new();
        for part in candidate["content"]["parts"].as_array().into_iter().flatten() {
            if let Some(fc) = part.get("functionCall") {
                let arguments: HashMap<String, Value> = fc["args"]
                    .as_object()
                    .map(|args| args.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                parts.push(ResponsePart::FunctionCall(ToolCall {
                    name: fc["name"].as_str().unwrap_or_default().to_string(),
                    arguments,
                    id: None,
                }));
            } else if let Some(text) = part["text"].as_str() {
                parts.push(ResponsePart::Text(text.to_string()));
            }
        }

        let finish_reason = candidate["finishReason"].as_str().map(|r| match r {
            "STOP" if parts.iter().any(|p| matches!(p, ResponsePart::FunctionCall(_))) => FinishReason::ToolUse,
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        });

        let usage = json.get("usageMetadata").map(|meta| {
            let count = |key: &str| u32::try_from(meta[key].as_u64().unwrap_or(0)).unwrap_or(u32::MAX);
            TokenUsage {
                prompt_tokens: count("promptTokenCount"),
                completion_tokens: count("candidatesTokenCount"),
                total_tokens: count("totalTokenCount"),
            }
        });

        Ok(Completion {
            parts,
            model: model.to_string(),
            usage,
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[FunctionDeclaration],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = Self::build_request_body(messages, tools, options);

        tracing::debug!(model = %options.model, messages = messages.len(), tools = tools.len(), "Gemini request");

        let response = self
            .http
            .post(self.api_url(&options.model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited(status.to_string()));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AgentError::Auth(status.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!("HTTP {}: {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Self::parse_response(&json, &options.model)
    }
}
