//! Realtime News Tool
//!
//! Recent posts from a fixed list of crypto news channels.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use serde_json::json;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::report::clean_text;
use crate::channel::{ChannelSession, MessageOrder};
use crate::error::{BriefingError, Result};
use crate::model::ChannelMessage;

/// Channels queried, in report order
pub const NEWS_CHANNELS: [&str; 2] = ["wublockchainenglish", "watcherguru"];
const MESSAGES_PER_CHANNEL: usize = 10;
const DEFAULT_HOURS: i64 = 1;
const MAX_HOURS: i64 = 72;

/// Check the lookback window
pub fn validate_hours(hours: i64) -> Result<u32> {
    u32::try_from(hours)
        .ok()
        .filter(|h| (1..=MAX_HOURS).contains(&i64::from(*h)))
        .ok_or_else(|| {
            BriefingError::InvalidArgument(format!(
                "'hours' must be between 1 and {}, got {}",
                MAX_HOURS, hours
            ))
        })
}

/// Render the news briefing
pub fn render_news(messages: &[ChannelMessage], hours: u32) -> String {
    if messages.is_empty() {
        return format!("No new news from the tracked channels in the last {} hour(s).", hours);
    }

    let mut lines = vec![format!("Top news from the last {} hour(s):", hours)];
    lines.extend(messages.iter().map(|m| {
        format!(
            "- [{}] @{}: {}",
            m.date.format("%m-%d %H:%M"),
            m.channel,
            clean_text(&m.text)
        )
    }));
    lines.join("\n")
}

/// Tool for channel news lookups
pub struct RealtimeNewsTool {
    channel: ChannelSession,
}

impl RealtimeNewsTool {
    pub fn new(channel: ChannelSession) -> Self {
        Self { channel }
    }

    /// Messages of every news channel within the window, grouped by channel
    pub async fn collect(&self, hours: u32) -> Result<Vec<ChannelMessage>> {
        let client = self.channel.require()?;
        let since = Utc::now() - chrono::Duration::hours(i64::from(hours));

        let per_channel = join_all(NEWS_CHANNELS.iter().map(|name| {
            client.messages_since(name, since, MESSAGES_PER_CHANNEL, MessageOrder::OldestFirst)
        }))
        .await;

        let mut messages = Vec::new();
        for (name, result) in NEWS_CHANNELS.iter().zip(per_channel) {
            let found = result?;
            tracing::debug!(channel = name, count = found.len(), "News channel read");
            messages.extend(found);
        }
        Ok(messages)
    }
}

#[async_trait]
impl Tool for RealtimeNewsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_realtime_news".into(),
            description: "Get the latest crypto news posted to major news channels within the given number of hours."
                .into(),
            parameters: vec![ParameterSchema {
                name: "hours".into(),
                param_type: "integer".into(),
                description: format!("How many hours back to look, between 1 and {}", MAX_HOURS),
                required: false,
                default: Some(json!(DEFAULT_HOURS)),
            }],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let hours = validate_hours(call.integer("hours")?.unwrap_or(DEFAULT_HOURS))?;

        let messages = self.collect(hours).await?;
        tracing::info!(hours, count = messages.len(), "News collected");

        Ok(ToolResult::success("get_realtime_news", render_news(&messages, hours)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MockChannelClient;
    use agent_core::AgentError;
    use chrono::{DateTime, Duration};
    use std::sync::Arc;

    fn at(hours_ago: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::hours(hours_ago)
    }

    fn news_client(now: DateTime<Utc>) -> MockChannelClient {
        MockChannelClient::new()
            .with_messages(
                "watcherguru",
                vec![
                    ChannelMessage::new("watcherguru", at(2, now), "JUST IN: ETF inflows\nhit record"),
                    ChannelMessage::new("watcherguru", at(20, now), "Bitcoin breaks $100k"),
                ],
            )
            .with_messages(
                "wublockchainenglish",
                vec![
                    ChannelMessage::new("wublockchainenglish", at(3, now), "Exchange lists new token"),
                    ChannelMessage::new("wublockchainenglish", at(23, now), "Mining difficulty adjusts"),
                    ChannelMessage::new("wublockchainenglish", at(30, now), "Too old to report"),
                ],
            )
    }

    fn news_call(hours: serde_json::Value) -> ToolCall {
        ToolCall::new("get_realtime_news").with_arg("hours", hours)
    }

    #[tokio::test]
    async fn test_channel_order_then_chronological() {
        let now = Utc::now();
        let tool = RealtimeNewsTool::new(ChannelSession::new(Arc::new(news_client(now))));

        let messages = tool.collect(24).await.unwrap();
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Mining difficulty adjusts",
                "Exchange lists new token",
                "Bitcoin breaks $100k",
                "JUST IN: ETF inflows\nhit record",
            ]
        );

        let result = tool.execute(&news_call(json!(24))).await.unwrap();
        let lines: Vec<_> = result.output.lines().collect();
        assert_eq!(lines[0], "Top news from the last 24 hour(s):");
        assert_eq!(
            lines[1],
            format!("- [{}] @wublockchainenglish: Mining difficulty adjusts", at(23, now).format("%m-%d %H:%M"))
        );
        assert!(lines[4].ends_with("@watcherguru: JUST IN: ETF inflows hit record"));
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn test_out_of_range_hours_rejected_before_fetch() {
        let client = Arc::new(MockChannelClient::new());
        let tool = RealtimeNewsTool::new(ChannelSession::new(client.clone()));

        for hours in [json!(0), json!(73), json!(-5), json!(2.5), json!("24")] {
            let err = tool.execute(&news_call(hours)).await.unwrap_err();
            assert!(matches!(err, AgentError::ToolValidation(_)));
        }
        assert_eq!(client.queries(), 0);
    }

    #[tokio::test]
    async fn test_default_window_and_empty_result() {
        let client = Arc::new(news_client(Utc::now()));
        let tool = RealtimeNewsTool::new(ChannelSession::new(client.clone()));

        let result = tool.execute(&ToolCall::new("get_realtime_news")).await.unwrap();
        assert_eq!(result.output, "No new news from the tracked channels in the last 1 hour(s).");
        assert_eq!(client.queries(), NEWS_CHANNELS.len());
    }

    #[tokio::test]
    async fn test_missing_session_is_not_ready() {
        let tool = RealtimeNewsTool::new(ChannelSession::unavailable("not configured"));
        let err = tool.execute(&news_call(json!(6))).await.unwrap_err();
        assert!(err.user_message().contains("not available"));
    }

    #[tokio::test]
    async fn test_channel_failure_is_domain_error() {
        let tool = RealtimeNewsTool::new(ChannelSession::new(Arc::new(MockChannelClient::failing())));
        let err = tool.execute(&news_call(json!(6))).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[test]
    fn test_validate_hours_bounds() {
        assert_eq!(validate_hours(1).unwrap(), 1);
        assert_eq!(validate_hours(72).unwrap(), 72);
        assert!(validate_hours(0).is_err());
        assert!(validate_hours(73).is_err());
    }
}
