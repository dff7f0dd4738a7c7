//! Mock Data Sources
//!
//! Static responses for tests and offline runs.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use super::{MarketDataSource, SentimentSource};
use crate::error::{BriefingError, Result};
use crate::model::{CoinDetails, CoinLinks, CoinMarketData, Dominance, SentimentIndex};

/// Mock market data with a small static coin table
#[derive(Default)]
pub struct MockMarketData {
    failing: bool,
    unconfigured: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the upstream were down
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Behaves as if no API key were set
    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Self::default()
        }
    }

    fn coin(id: &str) -> Option<CoinDetails> {
        // (name, symbol, rank, krw, usd, homepage)
        let (name, symbol, rank, krw, usd, homepage) = match id {
            "bitcoin" => ("Bitcoin", "btc", Some(1), dec!(145000000), dec!(97500), "http://www.bitcoin.org"),
            "ethereum" => ("Ethereum", "eth", Some(2), dec!(5100000), dec!(3450), "https://www.ethereum.org/"),
            "obscure-token" => ("Obscure Token", "obs", None, dec!(0.0042), dec!(0.000003), ""),
            _ => return None,
        };

        Some(CoinDetails {
            id: id.to_string(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            market_cap_rank: rank,
            market_data: Some(CoinMarketData {
                current_price: HashMap::from([("krw".to_string(), Some(krw)), ("usd".to_string(), Some(usd))]),
            }),
            links: Some(CoinLinks {
                homepage: vec![Some(homepage.to_string())],
            }),
        })
    }
}

#[async_trait]
impl MarketDataSource for MockMarketData {
    async fn global_dominance(&self) -> Result<Dominance> {
        if self.failing {
            return Err(BriefingError::fetch("market dominance", "mock upstream down"));
        }
        Ok(Dominance { btc: 56.12, eth: 12.34 })
    }

    async fn coin_details(&self, coin_id: &str) -> Result<CoinDetails> {
        if self.failing {
            return Err(BriefingError::fetch(format!("details for '{}'", coin_id), "mock upstream down"));
        }
        Self::coin(coin_id).ok_or_else(|| BriefingError::CoinNotFound(coin_id.to_string()))
    }

    fn is_configured(&self) -> bool {
        !self.unconfigured
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}

/// Mock sentiment index
#[derive(Default)]
pub struct MockSentiment {
    failing: bool,
}

impl MockSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl SentimentSource for MockSentiment {
    async fn fear_and_greed(&self) -> Result<SentimentIndex> {
        if self.failing {
            return Err(BriefingError::fetch("market sentiment", "mock upstream down"));
        }
        Ok(SentimentIndex {
            value: "72".into(),
            classification: "Greed".into(),
        })
    }

    fn name(&self) -> &str {
        "MockSentiment"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_market_data() {
        let market = MockMarketData::new();
        let btc = market.coin_details("bitcoin").await.unwrap();
        assert_eq!(btc.name, "Bitcoin");
        assert_eq!(btc.price_in("krw"), Some(dec!(145000000)));

        assert!(matches!(
            market.coin_details("__unknown__").await,
            Err(BriefingError::CoinNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failing_mocks() {
        assert!(MockMarketData::failing().global_dominance().await.is_err());
        assert!(MockSentiment::failing().fear_and_greed().await.is_err());
    }
}
