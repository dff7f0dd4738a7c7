//! Market Overview Tool
//!
//! Sentiment, dominance and recent whale transfers in one briefing. The
//! three sub-fetches run concurrently and fail independently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use super::report::{Fetched, clean_text};
use crate::channel::{ChannelSession, MessageOrder};
use crate::error::{BriefingError, Result};
use crate::model::{ChannelMessage, Dominance, SentimentIndex};
use crate::sources::{MarketDataSource, SentimentSource};

pub const WHALE_CHANNEL: &str = "whale_alert_io";
const WHALE_LIMIT: usize = 5;
const WHALE_WINDOW_HOURS: i64 = 1;
const FETCH_DEADLINE: Duration = Duration::from_secs(10);

const NO_WHALE_MOVEMENT: &str = "- Whale movements (last 1 hour): no movement detected";

/// Collected sub-fetch outcomes
#[derive(Debug, Clone)]
pub struct MarketOverview {
    pub sentiment: Fetched<SentimentIndex>,
    pub dominance: Fetched<Dominance>,
    pub whales: Fetched<Vec<ChannelMessage>>,
}

impl MarketOverview {
    /// Render the briefing; failed sections are left out
    pub fn render(&self) -> String {
        let mut lines = vec!["Market overview briefing:".to_string()];

        if let Some(index) = self.sentiment.ready() {
            lines.push(format!(
                "- Market sentiment: '{}' (index: {})",
                index.classification, index.value
            ));
        }

        if let Some(dominance) = self.dominance.ready() {
            lines.push(format!(
                "- Market dominance: BTC {:.1}%, ETH {:.1}%",
                dominance.btc, dominance.eth
            ));
        }

        match self.whales.ready() {
            Some(messages) if !messages.is_empty() => {
                lines.push(format!("- Whale movements (last {} hour):", WHALE_WINDOW_HOURS));
                lines.extend(messages.iter().map(|m| format!("  - {}", clean_text(&m.text))));
            }
            _ => lines.push(NO_WHALE_MOVEMENT.to_string()),
        }

        lines.join("\n")
    }
}

/// Run `fetch` under the sub-fetch deadline
async fn within_deadline<T>(source: &'static str, fetch: impl Future<Output = Result<T>>) -> Fetched<T> {
    let result = match tokio::time::timeout(FETCH_DEADLINE, fetch).await {
        Ok(result) => result,
        Err(_) => Err(BriefingError::Timeout(source.to_string())),
    };
    Fetched::from_result(source, result)
}

/// Tool for the market overview briefing
pub struct MarketOverviewTool {
    market: Arc<dyn MarketDataSource>,
    sentiment: Arc<dyn SentimentSource>,
    channel: ChannelSession,
}

impl MarketOverviewTool {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        sentiment: Arc<dyn SentimentSource>,
        channel: ChannelSession,
    ) -> Self {
        Self {
            market,
            sentiment,
            channel,
        }
    }

    async fn whale_alerts(&self) -> Result<Vec<ChannelMessage>> {
        let client = self.channel.require()?;
        let since = Utc::now() - chrono::Duration::hours(WHALE_WINDOW_HOURS);
        client
            .messages_since(WHALE_CHANNEL, since, WHALE_LIMIT, MessageOrder::NewestFirst)
            .await
    }

    /// Fetch all sections concurrently
    pub async fn gather(&self) -> MarketOverview {
        let (sentiment, dominance, whales) = tokio::join!(
            within_deadline("market sentiment", self.sentiment.fear_and_greed()),
            within_deadline("market dominance", self.market.global_dominance()),
            within_deadline("whale alerts", self.whale_alerts()),
        );

        MarketOverview {
            sentiment,
            dominance,
            whales,
        }
    }
}

#[async_trait]
impl Tool for MarketOverviewTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_market_overview".into(),
            description: "Get a briefing of the overall crypto market: the fear & greed sentiment index, \
                          BTC/ETH market dominance and large whale transfers from the last hour."
                .into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
        let overview = self.gather().await;
        tracing::info!(
            sentiment = overview.sentiment.is_ready(),
            dominance = overview.dominance.is_ready(),
            whales = overview.whales.is_ready(),
            "Market overview assembled"
        );
        Ok(ToolResult::success("get_market_overview", overview.render()))
    }
}
