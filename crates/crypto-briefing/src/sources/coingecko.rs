//! CoinGecko Client
//!
//! Demo-tier REST API, authenticated with the `x-cg-demo-api-key` header.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::MarketDataSource;
use crate::config::BriefingConfig;
use crate::error::{BriefingError, Result};
use crate::model::{CoinDetails, Dominance};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Query flags for `/coins/{id}`; only market data and links are needed
const COIN_DETAIL_FLAGS: [(&str, &str); 4] = [
    ("localization", "false"),
    ("tickers", "false"),
    ("community_data", "false"),
    ("developer_data", "false"),
];

#[derive(Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Deserialize)]
struct GlobalData {
    #[serde(default)]
    market_cap_percentage: HashMap<String, f64>,
}

pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &BriefingConfig) -> Result<Self> {
        Self::new(config.coingecko_base_url.clone(), config.coingecko_api_key.clone())
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or(BriefingError::MissingApiKey("CoinGecko API key"))
    }

    /// `base_url` joined with escaped path segments
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BriefingError::Config(format!("invalid CoinGecko base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| BriefingError::Config("CoinGecko base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        tracing::debug!(url = %url, "CoinGecko request");

        let response = self
            .http
            .get(url)
            .query(query)
            .header(API_KEY_HEADER, api_key)
            .send()
            .await?;
        Ok(response)
    }
}

/// Map a non-success status to a domain error
fn classify_status(status: StatusCode, what: &str, coin_id: Option<&str>) -> Result<()> {
    match (status, coin_id) {
        (s, _) if s.is_success() => Ok(()),
        (StatusCode::NOT_FOUND, Some(id)) => Err(BriefingError::CoinNotFound(id.to_string())),
        (s, _) => Err(BriefingError::fetch(what, format!("HTTP {}", s))),
    }
}

/// A share missing from the response counts as 0%
fn dominance_from(global: GlobalResponse) -> Dominance {
    let share = |key: &str| global.data.market_cap_percentage.get(key).copied().unwrap_or(0.0);
    Dominance {
        btc: share("btc"),
        eth: share("eth"),
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    async fn global_dominance(&self) -> Result<Dominance> {
        let response = self.get(self.url(&["global"])?, &[]).await?;
        classify_status(response.status(), "market dominance", None)?;

        let global: GlobalResponse = response
            .json()
            .await
            .map_err(|e| BriefingError::fetch("market dominance", e))?;
        Ok(dominance_from(global))
    }

    async fn coin_details(&self, coin_id: &str) -> Result<CoinDetails> {
        let response = self
            .get(self.url(&["coins", coin_id])?, &COIN_DETAIL_FLAGS)
            .await
            .map_err(|e| match e {
                BriefingError::Network(e) => BriefingError::fetch(format!("details for '{}'", coin_id), e),
                other => other,
            })?;
        classify_status(response.status(), &format!("details for '{}'", coin_id), Some(coin_id))?;

        response
            .json()
            .await
            .map_err(|e| BriefingError::fetch(format!("details for '{}'", coin_id), e))
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
