//! Fear & Greed Index Client (alternative.me, no auth)

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::SentimentSource;
use crate::error::{BriefingError, Result};
use crate::model::SentimentIndex;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngEntry>,
}

#[derive(Deserialize)]
struct FngEntry {
    value: String,
    value_classification: String,
}

pub struct FearGreedClient {
    http: reqwest::Client,
    url: String,
}

impl FearGreedClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, url: url.into() })
    }
}

fn latest(response: FngResponse) -> Result<SentimentIndex> {
    response
        .data
        .into_iter()
        .next()
        .map(|entry| SentimentIndex {
            value: entry.value,
            classification: entry.value_classification,
        })
        .ok_or_else(|| BriefingError::fetch("market sentiment", "empty index response"))
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    async fn fear_and_greed(&self) -> Result<SentimentIndex> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BriefingError::fetch("market sentiment", format!("HTTP {}", status)));
        }

        let body: FngResponse = response
            .json()
            .await
            .map_err(|e| BriefingError::fetch("market sentiment", e))?;
        latest(body)
    }

    fn name(&self) -> &str {
        "alternative.me"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latest_entry() {
        let response: FngResponse = serde_json::from_value(json!({
            "name": "Fear and Greed Index",
            "data": [{"value": "72", "value_classification": "Greed", "timestamp": "1733011200"}],
            "metadata": {"error": null}
        }))
        .unwrap();
        assert_eq!(
            latest(response).unwrap(),
            SentimentIndex {
                value: "72".into(),
                classification: "Greed".into()
            }
        );
    }

    #[test]
    fn test_empty_data_is_fetch_error() {
        let response: FngResponse = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(matches!(latest(response), Err(BriefingError::Fetch { .. })));
    }
}
