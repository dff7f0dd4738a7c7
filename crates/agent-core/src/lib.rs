//! # agent-core
//!
//! Core agent logic: provider-agnostic LLM abstraction, tool system, the
//! tool protocol wire types and the function-calling dispatch loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ChatSession                           │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Dispatch   │  │ ToolBackend │  │   LlmProvider       │  │
//! │  │    Loop     │──│ (local or   │──│   (Strategy)        │  │
//! │  │             │  │  remote)    │  │                     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │          schema bridge: tool schemas → function decls        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait lets the loop run against Gemini or any other
//! function-calling model; `ToolBackend` lets it run against the in-process
//! [`ToolRegistry`] or a remote tool server.

pub mod error;
pub mod message;
pub mod protocol;
pub mod provider;
pub mod reasoning;
pub mod schema;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use protocol::ToolDescriptor;
pub use provider::{Completion, GenerationOptions, LlmProvider, ResponsePart};
pub use reasoning::{Agent, AgentBuilder, TurnOutcome};
pub use schema::{FunctionDeclaration, strip_keys};
pub use session::ChatSession;
pub use tool::{ParameterSchema, Tool, ToolBackend, ToolCall, ToolRegistry, ToolResult, ToolSchema};
