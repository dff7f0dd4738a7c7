//! Messaging Channel Access
//!
//! Read-only access to public broadcast channels through one long-lived,
//! authenticated user session. The session is opened once at startup,
//! injected into the tools that need it and closed at shutdown.

mod mock;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use mock::MockChannelClient;
#[cfg(feature = "telegram")]
pub use telegram::TelegramChannelClient;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::TelegramConfig;
use crate::error::{BriefingError, Result};
use crate::model::ChannelMessage;

/// Order of the messages returned from a window query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOrder {
    /// The earliest messages of the window, in chronological order.
    ///
    /// Readers walk history newest first under a scan bound, so for a window
    /// busier than that bound this is the earliest of the messages reached,
    /// not of the whole window.
    OldestFirst,
    /// The latest messages of the window, most recent first
    NewestFirst,
}

/// Channel reader (Strategy pattern)
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// Up to `limit` non-empty text messages posted to `channel` at or after
    /// `since`
    async fn messages_since(
        &self,
        channel: &str,
        since: DateTime<Utc>,
        limit: usize,
        order: MessageOrder,
    ) -> Result<Vec<ChannelMessage>>;

    /// Release the underlying connection
    async fn disconnect(&self) {}

    fn name(&self) -> &str;
}

/// Narrow a newest-first scan down to the requested window.
///
/// Messages older than `since` and blank texts are dropped first.
pub fn select_window(
    newest_first: Vec<ChannelMessage>,
    since: DateTime<Utc>,
    limit: usize,
    order: MessageOrder,
) -> Vec<ChannelMessage> {
    let mut window: Vec<ChannelMessage> = newest_first
        .into_iter()
        .filter(|m| m.date >= since && !m.text.trim().is_empty())
        .collect();

    if order == MessageOrder::OldestFirst {
        window.reverse();
    }
    window.truncate(limit);
    window
}

/// The process-wide channel session.
///
/// Cheap to clone; every clone refers to the same connection. When the
/// session could not be opened it stays absent and the channel-backed tools
/// report it as not ready.
#[derive(Clone)]
pub struct ChannelSession {
    client: Option<Arc<dyn ChannelClient>>,
    unavailable_reason: String,
}

impl ChannelSession {
    pub fn new(client: Arc<dyn ChannelClient>) -> Self {
        Self {
            client: Some(client),
            unavailable_reason: String::new(),
        }
    }

    /// A session that was never established
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            client: None,
            unavailable_reason: reason.into(),
        }
    }

    /// Open the session described by `config`.
    ///
    /// Failure is logged and yields an unavailable session; the server keeps
    /// serving the tools that do not need the channel.
    pub async fn connect(config: Option<&TelegramConfig>) -> Self {
        let Some(config) = config else {
            return Self::unavailable("Telegram credentials are not configured");
        };
        Self::open(config).await
    }

    #[cfg(feature = "telegram")]
    async fn open(config: &TelegramConfig) -> Self {
        match TelegramChannelClient::connect(config).await {
            Ok(client) => {
                tracing::info!(api_id = config.api_id, "Telegram session connected");
                Self::new(Arc::new(client))
            }
            Err(e) => {
                tracing::error!(error = %e, "Telegram session could not be opened");
                Self::unavailable(e.to_string())
            }
        }
    }

    #[cfg(not(feature = "telegram"))]
    async fn open(config: &TelegramConfig) -> Self {
        tracing::warn!(api_id = config.api_id, "Built without the 'telegram' feature");
        Self::unavailable("this build has no Telegram support")
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// The live client, or a session-not-ready error
    pub fn require(&self) -> Result<&Arc<dyn ChannelClient>> {
        self.client
            .as_ref()
            .ok_or_else(|| BriefingError::SessionNotReady(self.unavailable_reason.clone()))
    }

    pub async fn shutdown(&self) {
        if let Some(client) = &self.client {
            client.disconnect().await;
            tracing::info!(client = client.name(), "Channel session closed");
        }
    }
}

impl std::fmt::Debug for ChannelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSession")
            .field("client", &self.client.as_ref().map(|c| c.name()))
            .field("unavailable_reason", &self.unavailable_reason)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn message(minutes_ago: i64, text: &str) -> ChannelMessage {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        ChannelMessage::new("whale_alert_io", now - Duration::minutes(minutes_ago), text)
    }

    fn scan() -> Vec<ChannelMessage> {
        vec![
            message(5, "newest"),
            message(10, "   "),
            message(20, "middle"),
            message(50, "oldest in window"),
            message(90, "outside window"),
        ]
    }

    #[test]
    fn test_select_window_newest_first() {
        let since = Utc.with_ymd_and_hms(2025, 1, 15, 11, 0, 0).unwrap();
        let selected = select_window(scan(), since, 2, MessageOrder::NewestFirst);
        let texts: Vec<_> = selected.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["newest", "middle"]);
    }

    #[test]
    fn test_select_window_oldest_first() {
        let since = Utc.with_ymd_and_hms(2025, 1, 15, 11, 0, 0).unwrap();
        let selected = select_window(scan(), since, 2, MessageOrder::OldestFirst);
        let texts: Vec<_> = selected.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["oldest in window", "middle"]);
    }

    #[tokio::test]
    async fn test_unavailable_session() {
        let session = ChannelSession::connect(None).await;
        assert!(!session.is_connected());
        assert!(matches!(session.require(), Err(BriefingError::SessionNotReady(_))));
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_disconnects_client() {
        let client = Arc::new(MockChannelClient::new());
        let session = ChannelSession::new(client.clone());
        assert!(session.require().is_ok());

        session.clone().shutdown().await;
        assert!(client.is_disconnected());
    }
}
