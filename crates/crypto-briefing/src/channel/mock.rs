//! Mock Channel Client
//!
//! Serves fixed messages per channel and counts the queries it receives.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ChannelClient, MessageOrder, select_window};
use crate::error::{BriefingError, Result};
use crate::model::ChannelMessage;

#[derive(Default)]
pub struct MockChannelClient {
    messages: HashMap<String, Vec<ChannelMessage>>,
    failing: bool,
    queries: AtomicUsize,
    disconnected: AtomicBool,
}

impl MockChannelClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Add messages to `channel`, in any order
    pub fn with_messages(mut self, channel: &str, messages: Vec<ChannelMessage>) -> Self {
        self.messages.entry(channel.to_string()).or_default().extend(messages);
        self
    }

    /// Number of `messages_since` calls so far
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelClient for MockChannelClient {
    async fn messages_since(
        &self,
        channel: &str,
        since: DateTime<Utc>,
        limit: usize,
        order: MessageOrder,
    ) -> Result<Vec<ChannelMessage>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(BriefingError::Channel(format!("mock channel @{} unreachable", channel)));
        }

        let mut newest_first = self.messages.get(channel).cloned().unwrap_or_default();
        newest_first.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(select_window(newest_first, since, limit, order))
    }

    async fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "MockChannel"
    }
}
