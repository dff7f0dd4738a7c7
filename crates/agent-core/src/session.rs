//! Session Management
//!
//! A chat session pairs an [`Agent`] with the conversation it accumulates.
//! A turn that fails part-way leaves the history in an unknown shape, so the
//! session throws the history away and starts over from the system prompt.

use uuid::Uuid;

use crate::error::Result;
use crate::message::Conversation;
use crate::reasoning::{Agent, TurnOutcome};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interactive chat session
pub struct ChatSession {
    id: SessionId,
    agent: Agent,
    conversation: Conversation,
    turns: usize,
}

impl ChatSession {
    pub fn new(agent: Agent) -> Self {
        let conversation = agent.new_conversation();
        Self {
            id: SessionId::new(),
            agent,
            conversation,
            turns: 0,
        }
    }

    /// Run one user turn; any error resets the conversation
    pub async fn send(&mut self, query: &str) -> Result<TurnOutcome> {
        match self.agent.process_query(&mut self.conversation, query).await {
            Ok(outcome) => {
                self.turns += 1;
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(session = %self.id, error = %e, "Turn failed, resetting conversation");
                self.reset();
                Err(e)
            }
        }
    }

    /// Drop all history except the system prompt
    pub fn reset(&mut self) {
        self.conversation.clear_history();
        self.turns = 0;
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Completed turns since the last reset
    pub fn turns(&self) -> usize {
        self.turns
    }
}
