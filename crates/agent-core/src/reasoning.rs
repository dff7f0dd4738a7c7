//! Tool-Call Dispatch Loop
//!
//! One user turn is a small state machine:
//!
//! ```text
//! AwaitingModelResponse ──(text)──────────────────────────────────────────► Done
//!          │
//!          └─(function call)─► InvokingTool ─► ToolResultReceived ─► AwaitingFinalAnswer ─► Done
//! ```
//!
//! Only the first part of the model response is inspected, so at most one
//! tool runs per turn. The final-answer request offers no tools.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::schema::to_function_declarations;
use crate::tool::{ToolBackend, ToolCall, ToolResult};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt
    pub system_prompt: String,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. Use the available tools when they help answer the question.";

/// States of a single user turn
#[derive(Debug)]
enum TurnState {
    AwaitingModelResponse,
    InvokingTool(ToolCall),
    ToolResultReceived(ToolCall, ToolResult),
    AwaitingFinalAnswer,
    Done(String),
}

/// What a finished turn produced
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// Final natural-language answer
    pub answer: String,

    /// Tool invoked on the way, if any
    pub tool_call: Option<ToolCall>,

    /// Whether that tool reported a domain failure
    pub tool_failed: bool,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolBackend>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolBackend>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Fresh conversation seeded with the system prompt
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_system_prompt(self.config.system_prompt.clone())
    }

    /// Run one user turn against `conversation`.
    ///
    /// On error the conversation may hold a partial turn; callers are
    /// expected to discard it (see [`crate::session::ChatSession`]).
    pub async fn process_query(
        &self,
        conversation: &mut Conversation,
        query: &str,
    ) -> Result<TurnOutcome> {
        if conversation.is_empty() {
            conversation.push(Message::system(self.config.system_prompt.clone()));
        }

        let declarations = to_function_declarations(&self.tools.list_tools().await?);
        conversation.push(Message::user(query));

        let mut tool_call = None;
        let mut tool_failed = false;
        let mut state = TurnState::AwaitingModelResponse;

        loop {
            state = match state {
                TurnState::AwaitingModelResponse => {
                    tracing::debug!(provider = self.provider.name(), tools = declarations.len(), "Sending query to model");
                    let completion = self
                        .provider
                        .complete(conversation.messages(), &declarations, &self.config.generation)
                        .await?;

                    match completion.first_tool_call() {
                        Some(call) => {
                            let mut call = call.clone();
                            if call.id.is_none() {
                                call.id = Some(uuid::Uuid::new_v4().to_string());
                            }
                            conversation.push(Message::assistant_call(call.clone()));
                            TurnState::InvokingTool(call)
                        }
                        None => {
                            let text = answer_text(&completion)?;
                            conversation.push(Message::assistant(text.clone()));
                            TurnState::Done(text)
                        }
                    }
                }
                TurnState::InvokingTool(call) => {
                    tracing::info!(tool = %call.name, arguments = ?call.arguments, "Model requested tool");
                    let result = self.tools.call_tool(&call).await?;
                    TurnState::ToolResultReceived(call, result)
                }
                TurnState::ToolResultReceived(call, result) => {
                    if !result.success {
                        tracing::warn!(tool = %call.name, "Tool reported failure: {}", result.output);
                        tool_failed = true;
                    }
                    conversation.push(Message::tool(call.name.clone(), result.output));
                    tool_call = Some(call);
                    TurnState::AwaitingFinalAnswer
                }
                TurnState::AwaitingFinalAnswer => {
                    tracing::debug!("Relaying tool result to model");
                    let completion = self
                        .provider
                        .complete(conversation.messages(), &[], &self.config.generation)
                        .await?;
                    let text = answer_text(&completion)?;
                    conversation.push(Message::assistant(text.clone()));
                    TurnState::Done(text)
                }
                TurnState::Done(answer) => {
                    return Ok(TurnOutcome {
                        answer,
                        tool_call,
                        tool_failed,
                    });
                }
            };
        }
    }
}

/// Natural-language answer of a completion that must end the turn.
///
/// A second function call or a blank reply is an error rather than an
/// empty answer.
fn answer_text(completion: &Completion) -> Result<String> {
    if completion.first_tool_call().is_some() {
        return Err(AgentError::Provider("model returned no answer".into()));
    }
    let text = completion.content();
    if text.trim().is_empty() {
        return Err(AgentError::Provider("model returned no answer".into()));
    }
    Ok(text)
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<dyn ToolBackend>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolBackend>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self.tools
            .ok_or_else(|| AgentError::Config("Tool backend is required".into()))?;

        Ok(Agent::new(provider, tools, self.config))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::message::Role;
    use crate::protocol::ToolDescriptor;
    use crate::provider::ResponsePart;
    use crate::schema::FunctionDeclaration;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider replaying scripted completions and recording what it saw
    pub(crate) struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<Completion>>>,
        pub offered_tools: Mutex<Vec<usize>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedProvider {
        pub(crate) fn new(replies: Vec<Result<Completion>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                offered_tools: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _messages: &[Message],
            tools: &[FunctionDeclaration],
            _options: &GenerationOptions,
        ) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.offered_tools.lock().unwrap().push(tools.len());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
        }
    }

    /// Backend with one tool that counts invocations
    pub(crate) struct CountingBackend {
        pub invocations: AtomicUsize,
        pub fail_with: Option<String>,
    }

    impl CountingBackend {
        pub(crate) fn new() -> Self {
            Self { invocations: AtomicUsize::new(0), fail_with: None }
        }
    }

    #[async_trait]
    impl ToolBackend for CountingBackend {
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
            Ok(vec![ToolDescriptor {
                name: "get_market_overview".into(),
                description: Some("Market briefing".into()),
                input_schema: json!({"type": "object", "title": "x", "properties": {}}),
            }])
        }

        async fn call_tool(&self, call: &ToolCall) -> Result<ToolResult> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            match &self.fail_with {
                Some(msg) => Ok(ToolResult::failure(&call.name, msg)),
                None => Ok(ToolResult::success(&call.name, "Market overview briefing:\n- Market sentiment: 'Greed'")),
            }
        }
    }

    pub(crate) fn call_completion(name: &str) -> Completion {
        Completion {
            parts: vec![ResponsePart::FunctionCall(ToolCall::new(name))],
            model: "scripted".into(),
            usage: None,
            finish_reason: None,
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, backend: Arc<CountingBackend>) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tools(backend)
            .system_prompt("You are a crypto analyst.")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_direct_answer_is_one_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("m", "Hello!"))]));
        let backend = Arc::new(CountingBackend::new());
        let agent = agent(provider.clone(), backend.clone());

        let mut conversation = agent.new_conversation();
        let outcome = agent.process_query(&mut conversation, "hi").await.unwrap();

        assert_eq!(outcome.answer, "Hello!");
        assert!(outcome.tool_call.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.invocations.load(Ordering::SeqCst), 0);
        assert_eq!(conversation.len(), 3);
    }

    #[tokio::test]
    async fn test_function_call_invokes_tool_once_then_final_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call_completion("get_market_overview")),
            Ok(Completion::text("m", "The market is greedy.")),
        ]));
        let backend = Arc::new(CountingBackend::new());
        let agent = agent(provider.clone(), backend.clone());

        let mut conversation = agent.new_conversation();
        let outcome = agent.process_query(&mut conversation, "how is the market?").await.unwrap();

        assert_eq!(outcome.answer, "The market is greedy.");
        assert_eq!(outcome.tool_call.map(|c| c.name), Some("get_market_overview".to_string()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(backend.invocations.load(Ordering::SeqCst), 1);
        // tools offered on the first request only
        assert_eq!(*provider.offered_tools.lock().unwrap(), vec![1, 0]);

        let roles: Vec<_> = conversation.messages().iter().map(|m| m.role.clone()).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(conversation.messages()[3].name.as_deref(), Some("get_market_overview"));
    }

    #[tokio::test]
    async fn test_only_first_of_parallel_calls_runs() {
        let mut first = call_completion("get_market_overview");
        first.parts.push(ResponsePart::FunctionCall(ToolCall::new("get_realtime_news")));
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(first), Ok(Completion::text("m", "done"))]));
        let backend = Arc::new(CountingBackend::new());
        let agent = agent(provider.clone(), backend.clone());

        let mut conversation = agent.new_conversation();
        agent.process_query(&mut conversation, "everything please").await.unwrap();
        assert_eq!(backend.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_is_relayed_not_raised() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call_completion("get_market_overview")),
            Ok(Completion::text("m", "Sorry, I could not fetch that.")),
        ]));
        let mut backend = CountingBackend::new();
        backend.fail_with = Some("session not ready".into());
        let agent = agent(provider, Arc::new(backend));

        let mut conversation = agent.new_conversation();
        let outcome = agent.process_query(&mut conversation, "news?").await.unwrap();
        assert!(outcome.tool_failed);
        assert_eq!(conversation.messages()[3].content, "session not ready");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::RateLimited("429".into()))]));
        let agent = agent(provider, Arc::new(CountingBackend::new()));

        let mut conversation = agent.new_conversation();
        let err = agent.process_query(&mut conversation, "hi").await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_second_function_call_is_not_an_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(call_completion("get_market_overview")),
            Ok(call_completion("get_realtime_news")),
        ]));
        let backend = Arc::new(CountingBackend::new());
        let agent = agent(provider, backend.clone());

        let mut conversation = agent.new_conversation();
        let err = agent.process_query(&mut conversation, "market and news?").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(ref msg) if msg == "model returned no answer"));
        assert_eq!(backend.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_reply_is_not_an_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(Completion::text("m", "  "))]));
        let agent = agent(provider, Arc::new(CountingBackend::new()));

        let mut conversation = agent.new_conversation();
        let err = agent.process_query(&mut conversation, "hi").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(AgentBuilder::new().build().is_err());
    }
}
