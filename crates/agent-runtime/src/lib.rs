//! # agent-runtime
//!
//! Concrete backends for the agent-core traits.
//!
//! ## Providers
//!
//! - **Gemini**: Google Generative Language API with native function calling
//!
//! ## Tool backends
//!
//! - **McpClient**: remote tool server over streamable HTTP
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{GeminiProvider, McpClient};
//!
//! let tools = Arc::new(McpClient::for_host("localhost", 8123)?);
//! tools.connect().await?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(GeminiProvider::from_env()?))
//!     .tools(tools)
//!     .build()?;
//! ```

pub mod gemini;
pub mod mcp_client;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use mcp_client::McpClient;

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentBuilder, AgentError, ChatSession, LlmProvider, Message, Result, Role, ToolBackend,
};
