//! Telegram Channel Client
//!
//! MTProto user session via `grammers`. The client is internally
//! synchronised, so one instance serves concurrent tool calls.
//!
//! Usernames are resolved once and the packed chat is kept for the life of
//! the session; `contacts.resolveUsername` is heavily flood-limited.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use grammers_client::{Client, Config, InitParams};
use grammers_session::{PackedChat, Session};
use tokio::sync::RwLock;

use super::{ChannelClient, MessageOrder, select_window};
use crate::config::{SessionSource, TelegramConfig};
use crate::error::{BriefingError, Result};
use crate::model::ChannelMessage;

/// Upper bound on messages inspected per query.
///
/// History can only be walked newest first, so an oldest-first query over a
/// window holding more than this many messages never reaches its start.
const MAX_SCAN: usize = 500;

pub struct TelegramChannelClient {
    client: Client,
    session_file: Option<PathBuf>,
    chats: ChatCache,
}

/// Resolved channels, keyed by normalised username
#[derive(Default)]
struct ChatCache(RwLock<HashMap<String, PackedChat>>);

impl ChatCache {
    fn key(username: &str) -> String {
        username.trim().trim_start_matches('@').to_lowercase()
    }

    async fn get(&self, username: &str) -> Option<PackedChat> {
        self.0.read().await.get(&Self::key(username)).copied()
    }

    async fn insert(&self, username: &str, chat: PackedChat) {
        self.0.write().await.insert(Self::key(username), chat);
    }
}

/// Load a session from its configured source
pub fn load_session(source: &SessionSource) -> Result<Session> {
    match source {
        SessionSource::Serialized(encoded) => {
            let bytes = STANDARD
                .decode(encoded.trim())
                .map_err(|e| BriefingError::Config(format!("TELEGRAM_SESSION_STRING is not valid base64: {}", e)))?;
            Session::load(&bytes).map_err(|e| BriefingError::Config(format!("invalid session string: {}", e)))
        }
        SessionSource::File(path) => Session::load_file_or_create(path)
            .map_err(|e| BriefingError::Config(format!("cannot open session file {}: {}", path.display(), e))),
    }
}

/// Base64 form of a session, as accepted by `TELEGRAM_SESSION_STRING`
pub fn encode_session(session: &Session) -> String {
    STANDARD.encode(session.save())
}

/// Connect without checking authorisation
pub async fn connect_client(config: &TelegramConfig) -> Result<Client> {
    let session = load_session(&config.session)?;
    Client::connect(Config {
        session,
        api_id: config.api_id,
        api_hash: config.api_hash.clone(),
        params: InitParams::default(),
    })
    .await
    .map_err(|e| BriefingError::Channel(format!("connection failed: {}", e)))
}

impl TelegramChannelClient {
    /// Connect and require an authorised session
    pub async fn connect(config: &TelegramConfig) -> Result<Self> {
        let client = connect_client(config).await?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| BriefingError::Channel(e.to_string()))?;
        if !authorized {
            return Err(BriefingError::SessionNotReady(
                "the Telegram session is not signed in; run telegram-login first".into(),
            ));
        }

        let session_file = match &config.session {
            SessionSource::File(path) => Some(path.clone()),
            SessionSource::Serialized(_) => None,
        };
        Ok(Self {
            client,
            session_file,
            chats: ChatCache::default(),
        })
    }

    async fn resolve(&self, channel: &str) -> Result<PackedChat> {
        if let Some(chat) = self.chats.get(channel).await {
            return Ok(chat);
        }

        let chat = self
            .client
            .resolve_username(channel)
            .await
            .map_err(|e| BriefingError::Channel(format!("@{}: {}", channel, e)))?
            .ok_or_else(|| BriefingError::Channel(format!("channel @{} does not exist", channel)))?
            .pack();
        self.chats.insert(channel, chat).await;
        tracing::debug!(channel, "Channel resolved");
        Ok(chat)
    }
}

#[async_trait]
impl ChannelClient for TelegramChannelClient {
    async fn messages_since(
        &self,
        channel: &str,
        since: DateTime<Utc>,
        limit: usize,
        order: MessageOrder,
    ) -> Result<Vec<ChannelMessage>> {
        let chat = self.resolve(channel).await?;

        // History comes newest first; stop at the window edge
        let mut iter = self.client.iter_messages(chat).limit(MAX_SCAN);
        let mut scanned = Vec::new();
        let mut inspected = 0;
        let mut reached_start = false;
        while let Some(message) = iter
            .next()
            .await
            .map_err(|e| BriefingError::Channel(format!("@{}: {}", channel, e)))?
        {
            inspected += 1;
            let date = message.date();
            if date < since {
                reached_start = true;
                break;
            }
            let text = message.text();
            if text.trim().is_empty() {
                continue;
            }
            scanned.push(ChannelMessage::new(channel, date, text));
            if order == MessageOrder::NewestFirst && scanned.len() >= limit {
                break;
            }
        }

        if order == MessageOrder::OldestFirst && !reached_start && inspected >= MAX_SCAN {
            tracing::warn!(channel, scanned = MAX_SCAN, "Scan bound hit before the window start; oldest messages not reached");
        }
        tracing::debug!(channel, found = scanned.len(), "Channel window scanned");
        Ok(select_window(scanned, since, limit, order))
    }

    async fn disconnect(&self) {
        if let Some(path) = &self.session_file {
            if let Err(e) = self.client.session().save_to_file(path) {
                tracing::warn!(error = %e, path = %path.display(), "Failed to persist Telegram session");
            }
        }
    }

    fn name(&self) -> &str {
        "Telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammers_session::PackedType;

    fn channel(id: i64) -> PackedChat {
        PackedChat {
            ty: PackedType::Broadcast,
            id,
            access_hash: Some(id * 7),
        }
    }

    #[tokio::test]
    async fn test_chat_cache_normalises_usernames() {
        let cache = ChatCache::default();
        assert_eq!(cache.get("watcherguru").await, None);

        cache.insert("@WatcherGuru", channel(42)).await;
        assert_eq!(cache.get("watcherguru").await, Some(channel(42)));
        assert_eq!(cache.get(" @watcherguru").await, Some(channel(42)));
        assert_eq!(cache.get("whale_alert_io").await, None);
    }

    #[tokio::test]
    async fn test_chat_cache_keeps_latest_resolution() {
        let cache = ChatCache::default();
        cache.insert("wublockchainenglish", channel(1)).await;
        cache.insert("wublockchainenglish", channel(2)).await;
        assert_eq!(cache.get("wublockchainenglish").await, Some(channel(2)));
    }
}
