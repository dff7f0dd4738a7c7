//! Domain Models
//!
//! Upstream payloads, reduced to the fields the briefings render.
//! Prices are `rust_decimal::Decimal`; CoinGecko sends them as JSON numbers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fear & greed index reading
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentIndex {
    /// 0 (extreme fear) to 100 (extreme greed), as reported
    pub value: String,

    /// e.g. "Greed"
    pub classification: String,
}

/// Market-cap share of the two largest assets, in percent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dominance {
    pub btc: f64,
    pub eth: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoinLinks {
    #[serde(default)]
    pub homepage: Vec<Option<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CoinMarketData {
    /// Price keyed by lowercase quote currency
    #[serde(default)]
    pub current_price: HashMap<String, Option<Decimal>>,
}

/// Coin detail record (`/coins/{id}`)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoinDetails {
    pub id: String,
    pub name: String,
    pub symbol: String,

    #[serde(default)]
    pub market_cap_rank: Option<u32>,

    #[serde(default)]
    pub market_data: Option<CoinMarketData>,

    #[serde(default)]
    pub links: Option<CoinLinks>,
}

impl CoinDetails {
    /// Price in the given quote currency
    pub fn price_in(&self, currency: &str) -> Option<Decimal> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.get(&currency.to_lowercase()).copied().flatten())
    }

    /// First non-empty homepage link
    pub fn homepage(&self) -> Option<&str> {
        self.links
            .as_ref()?
            .homepage
            .iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }
}

/// A text message posted to a public channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// Channel username, without the `@`
    pub channel: String,
    pub date: DateTime<Utc>,
    pub text: String,
}

impl ChannelMessage {
    pub fn new(channel: impl Into<String>, date: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            date,
            text: text.into(),
        }
    }
}
