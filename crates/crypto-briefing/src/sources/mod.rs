//! Upstream Data Sources
//!
//! Abstractions over the HTTP market-data APIs. Tools hold them as trait
//! objects so tests can swap in the mocks.

mod coingecko;
mod mock;
mod sentiment;

pub use coingecko::CoinGeckoClient;
pub use mock::{MockMarketData, MockSentiment};
pub use sentiment::FearGreedClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{CoinDetails, Dominance, SentimentIndex};

/// Market-data provider (Strategy pattern)
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// BTC / ETH share of total market capitalisation
    async fn global_dominance(&self) -> Result<Dominance>;

    /// Detail record for a provider coin id such as `bitcoin`
    async fn coin_details(&self, coin_id: &str) -> Result<CoinDetails>;

    /// Whether requests can be authenticated at all
    fn is_configured(&self) -> bool {
        true
    }

    fn name(&self) -> &str;
}

/// Market sentiment provider
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn fear_and_greed(&self) -> Result<SentimentIndex>;

    fn name(&self) -> &str;
}
