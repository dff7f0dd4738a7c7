//! Coin Details Tool
//!
//! Rank, price and homepage of a single coin by its CoinGecko id.

use std::sync::Arc;

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
    tool::ParameterSchema,
};

use super::report::{currency_symbol, format_price};
use crate::error::BriefingError;
use crate::model::CoinDetails;
use crate::sources::MarketDataSource;

/// Render the coin detail briefing
pub fn render_coin(coin: &CoinDetails, vs_currency: &str) -> String {
    let rank = coin
        .market_cap_rank
        .map_or_else(|| "N/A".to_string(), |rank| format!("#{}", rank));
    let price = coin.price_in(vs_currency).map_or_else(
        || "N/A".to_string(),
        |price| format!("{}{}", currency_symbol(vs_currency), format_price(price)),
    );

    [
        format!("'{}' ({}) details:", coin.name, coin.symbol.to_uppercase()),
        format!("- Market cap rank: {}", rank),
        format!("- Current price: {}", price),
        format!("- Homepage: {}", coin.homepage().unwrap_or("N/A")),
    ]
    .join("\n")
}

/// Tool for single-coin lookups
pub struct CoinDetailsTool {
    market: Arc<dyn MarketDataSource>,
    vs_currency: String,
}

impl CoinDetailsTool {
    pub fn new(market: Arc<dyn MarketDataSource>, vs_currency: impl Into<String>) -> Self {
        Self {
            market,
            vs_currency: vs_currency.into(),
        }
    }
}

#[async_trait]
impl Tool for CoinDetailsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_coin_details".into(),
            description: "Get the market cap rank, current price and homepage of one cryptocurrency.".into(),
            parameters: vec![ParameterSchema {
                name: "coin_id".into(),
                param_type: "string".into(),
                description: "CoinGecko coin id, e.g. 'bitcoin', 'ethereum' or 'solana'".into(),
                required: true,
                default: None,
            }],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let coin_id = call
            .string("coin_id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BriefingError::InvalidArgument("'coin_id' must be a non-empty string".into()))?
            .to_lowercase();

        if !self.market.is_configured() {
            return Err(BriefingError::MissingApiKey("CoinGecko API key").into());
        }

        let coin = self.market.coin_details(&coin_id).await?;
        tracing::info!(coin = %coin.id, source = self.market.name(), "Coin details fetched");

        Ok(ToolResult::success("get_coin_details", render_coin(&coin, &self.vs_currency)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockMarketData;
    use agent_core::{AgentError, ToolBackend, ToolRegistry};
    use serde_json::json;

    fn tool(currency: &str) -> CoinDetailsTool {
        CoinDetailsTool::new(Arc::new(MockMarketData::new()), currency)
    }

    #[tokio::test]
    async fn test_bitcoin_details() {
        let result = tool("krw")
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("bitcoin")))
            .await
            .unwrap();
        assert_eq!(
            result.output,
            "'Bitcoin' (BTC) details:\n\
             - Market cap rank: #1\n\
             - Current price: ₩145,000,000\n\
             - Homepage: http://www.bitcoin.org"
        );
    }

    #[tokio::test]
    async fn test_quote_currency_and_missing_fields() {
        let result = tool("usd")
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("obscure-token")))
            .await
            .unwrap();
        assert!(result.output.contains("- Market cap rank: N/A"));
        assert!(result.output.contains("- Current price: $0.000003"));
        assert!(result.output.ends_with("- Homepage: N/A"));

        let result = tool("chf")
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("bitcoin")))
            .await
            .unwrap();
        assert!(result.output.contains("- Current price: N/A"));
    }

    #[tokio::test]
    async fn test_unknown_coin_is_not_found() {
        let err = tool("krw")
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("__unknown__")))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
        assert!(err.user_message().contains("not found"));
    }

    #[tokio::test]
    async fn test_missing_api_key_rejected_before_fetch() {
        let tool = CoinDetailsTool::new(Arc::new(MockMarketData::unconfigured()), "krw");
        let err = tool
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("bitcoin")))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "The server has no CoinGecko API key configured.");
    }

    #[tokio::test]
    async fn test_blank_coin_id_rejected() {
        let err = tool("krw")
            .execute(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_registry_reports_domain_error_as_failed_result() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("krw"));

        let result = registry
            .call_tool(&ToolCall::new("get_coin_details").with_arg("coin_id", json!("__unknown__")))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.output, "Coin '__unknown__' was not found. Check the CoinGecko id.");
    }
}
