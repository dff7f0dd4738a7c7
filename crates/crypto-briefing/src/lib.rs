//! # crypto-briefing
//!
//! Crypto market briefings for a function-calling assistant: market
//! overview, single-coin details and realtime channel news, each rendered
//! as a short text report.
//!
//! ## Sources
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────┐
//! │  get_market_overview │  alternative.me fear & greed index   │
//! │                      │  CoinGecko /global dominance         │
//! │                      │  @whale_alert_io (last hour)         │
//! ├──────────────────────┼──────────────────────────────────────┤
//! │  get_coin_details    │  CoinGecko /coins/{id}               │
//! ├──────────────────────┼──────────────────────────────────────┤
//! │  get_realtime_news   │  @wublockchainenglish, @watcherguru  │
//! └──────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! Channel access goes through a single [`ChannelSession`] opened at
//! startup and shared by every tool that needs it.

pub mod channel;
pub mod config;
pub mod error;
pub mod model;
pub mod sources;
pub mod svckit;

use std::sync::Arc;

use agent_core::ToolRegistry;

pub use channel::{ChannelClient, ChannelSession, MessageOrder};
pub use config::{BriefingConfig, SessionSource, TelegramConfig};
pub use error::{BriefingError, Result};
pub use model::{ChannelMessage, CoinDetails, Dominance, SentimentIndex};
pub use sources::{MarketDataSource, SentimentSource};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CoinDetailsTool, MarketOverviewTool, RealtimeNewsTool};
}

/// Usage notes returned to clients on `initialize`
pub const SERVER_INSTRUCTIONS: &str = "Crypto market briefing tools. Use get_market_overview for the overall \
market mood, get_coin_details with a CoinGecko id (e.g. 'bitcoin') for one coin and get_realtime_news for \
recent headlines.";

/// Register the three briefing tools over the given sources
pub fn register_tools(
    registry: &mut ToolRegistry,
    market: Arc<dyn MarketDataSource>,
    sentiment: Arc<dyn SentimentSource>,
    channel: &ChannelSession,
    vs_currency: &str,
) {
    registry.register(tools::MarketOverviewTool::new(
        market.clone(),
        sentiment,
        channel.clone(),
    ));
    registry.register(tools::CoinDetailsTool::new(market, vs_currency));
    registry.register(tools::RealtimeNewsTool::new(channel.clone()));
}

/// Registry backed by the live upstream APIs
pub fn live_registry(config: &BriefingConfig, channel: &ChannelSession) -> Result<ToolRegistry> {
    let market = Arc::new(sources::CoinGeckoClient::from_config(config)?);
    let sentiment = Arc::new(sources::FearGreedClient::new(config.fear_greed_url.clone())?);

    let mut registry = ToolRegistry::new();
    register_tools(&mut registry, market, sentiment, channel, &config.vs_currency);
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sources::{MockMarketData, MockSentiment};

    #[test]
    fn test_register_tools() {
        let mut registry = ToolRegistry::new();
        register_tools(
            &mut registry,
            Arc::new(MockMarketData::new()),
            Arc::new(MockSentiment::new()),
            &ChannelSession::unavailable("test"),
            "krw",
        );
        assert_eq!(
            registry.names(),
            vec!["get_coin_details", "get_market_overview", "get_realtime_news"]
        );
    }

    #[test]
    fn test_live_registry_builds_without_credentials() {
        let registry = live_registry(&BriefingConfig::default(), &ChannelSession::unavailable("test")).unwrap();
        assert_eq!(registry.len(), 3);
    }
}
