//! Application State

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use agent_core::ToolRegistry;
use crypto_briefing::ChannelSession;

/// Sessions idle for longer than this are forgotten
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Live sessions kept at most; the least recently used one is evicted first
pub const MAX_SESSIONS: usize = 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The briefing tools
    pub tools: Arc<ToolRegistry>,

    /// Channel session shared with the tools (may be unavailable)
    pub channel: ChannelSession,

    /// Whether a market-data API key is configured
    pub market_data_configured: bool,

    /// MCP session ids issued by `initialize`, with their last use
    sessions: Arc<RwLock<HashMap<String, Instant>>>,
    session_idle_timeout: Duration,
    max_sessions: usize,
}

impl AppState {
    pub fn new(tools: ToolRegistry, channel: ChannelSession, market_data_configured: bool) -> Self {
        Self {
            tools: Arc::new(tools),
            channel,
            market_data_configured,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_idle_timeout: SESSION_IDLE_TIMEOUT,
            max_sessions: MAX_SESSIONS,
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_session_limits(mut self, idle_timeout: Duration, max_sessions: usize) -> Self {
        self.session_idle_timeout = idle_timeout;
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Issue a new session id
    pub async fn open_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, last_seen| now.duration_since(*last_seen) < self.session_idle_timeout);
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, last_seen)| **last_seen)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::debug!(session = %oldest, "MCP session evicted");
        }
        sessions.insert(id.clone(), now);
        id
    }

    /// Whether `id` is a live session; a hit counts as use
    pub async fn has_session(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(last_seen) if now.duration_since(*last_seen) < self.session_idle_timeout => {
                *last_seen = now;
                true
            }
            Some(_) => {
                sessions.remove(id);
                false
            }
            None => false,
        }
    }

    pub async fn close_session(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of sessions currently held
    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
