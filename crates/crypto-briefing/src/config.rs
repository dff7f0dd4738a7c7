//! Environment Configuration
//!
//! Everything is read from the process environment (a `.env` file is loaded
//! by the binaries before this runs). Parsing goes through a lookup function
//! so tests never have to touch the real environment.

use std::path::PathBuf;

use crate::error::{BriefingError, Result};

pub const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
pub const FEAR_GREED_URL: &str = "https://api.alternative.me/fng/?limit=1";
pub const DEFAULT_VS_CURRENCY: &str = "krw";

/// Where the messaging-channel session comes from
#[derive(Clone, PartialEq, Eq)]
pub enum SessionSource {
    /// Base64 session produced by `telegram-login`
    Serialized(String),
    /// Session file on disk
    File(PathBuf),
}

impl std::fmt::Debug for SessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionSource::Serialized(_) => f.write_str("Serialized([REDACTED])"),
            SessionSource::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Messaging-channel credentials
#[derive(Clone)]
pub struct TelegramConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session: SessionSource,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &"[REDACTED]")
            .field("session", &self.session)
            .finish()
    }
}

/// Tool server configuration
#[derive(Clone)]
pub struct BriefingConfig {
    /// CoinGecko demo API key; market-data tools fail without it
    pub coingecko_api_key: Option<String>,

    pub coingecko_base_url: String,

    /// Quote currency for coin prices
    pub vs_currency: String,

    pub fear_greed_url: String,

    /// `None` disables the channel-backed features
    pub telegram: Option<TelegramConfig>,
}

impl std::fmt::Debug for BriefingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BriefingConfig")
            .field("coingecko_api_key", &self.coingecko_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("coingecko_base_url", &self.coingecko_base_url)
            .field("vs_currency", &self.vs_currency)
            .field("fear_greed_url", &self.fear_greed_url)
            .field("telegram", &self.telegram)
            .finish()
    }
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            coingecko_api_key: None,
            coingecko_base_url: COINGECKO_API_BASE.into(),
            vs_currency: DEFAULT_VS_CURRENCY.into(),
            fear_greed_url: FEAR_GREED_URL.into(),
            telegram: None,
        }
    }
}

impl BriefingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = Self {
            coingecko_api_key: var("COINGECKO_API_KEY"),
            telegram: telegram_from(&var)?,
            ..Self::default()
        };
        if let Some(currency) = var("COINGECKO_VS_CURRENCY") {
            config.vs_currency = currency.to_lowercase();
        }
        if let Some(base) = var("COINGECKO_API_BASE") {
            config.coingecko_base_url = base;
        }

        if config.coingecko_api_key.is_none() {
            tracing::warn!("COINGECKO_API_KEY not set - market data tools will report an error");
        }
        Ok(config)
    }
}

fn telegram_from(var: &impl Fn(&str) -> Option<String>) -> Result<Option<TelegramConfig>> {
    let (Some(api_id), Some(api_hash)) = (var("TELEGRAM_API_ID"), var("TELEGRAM_API_HASH")) else {
        tracing::warn!("TELEGRAM_API_ID / TELEGRAM_API_HASH not set - channel features disabled");
        return Ok(None);
    };

    let api_id = api_id
        .parse::<i32>()
        .map_err(|_| BriefingError::Config(format!("TELEGRAM_API_ID must be an integer, got '{}'", api_id)))?;

    let session = if let Some(serialized) = var("TELEGRAM_SESSION_STRING") {
        SessionSource::Serialized(serialized)
    } else if let Some(path) = var("TELEGRAM_SESSION_FILE") {
        SessionSource::File(PathBuf::from(path))
    } else {
        tracing::warn!("Neither TELEGRAM_SESSION_STRING nor TELEGRAM_SESSION_FILE set - channel features disabled");
        return Ok(None);
    };

    Ok(Some(TelegramConfig {
        api_id,
        api_hash,
        session,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<BriefingConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        BriefingConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.coingecko_api_key.is_none());
        assert!(config.telegram.is_none());
        assert_eq!(config.vs_currency, "krw");
        assert_eq!(config.coingecko_base_url, COINGECKO_API_BASE);
    }

    #[test]
    fn test_session_string_preferred_over_file() {
        let config = config(&[
            ("TELEGRAM_API_ID", "1234"),
            ("TELEGRAM_API_HASH", "hash"),
            ("TELEGRAM_SESSION_STRING", "c2Vzc2lvbg=="),
            ("TELEGRAM_SESSION_FILE", "telegram.session"),
        ])
        .unwrap();
        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.api_id, 1234);
        assert_eq!(telegram.session, SessionSource::Serialized("c2Vzc2lvbg==".into()));
    }

    #[test]
    fn test_session_file() {
        let config = config(&[
            ("TELEGRAM_API_ID", "1234"),
            ("TELEGRAM_API_HASH", "hash"),
            ("TELEGRAM_SESSION_FILE", "telegram.session"),
        ])
        .unwrap();
        assert_eq!(
            config.telegram.unwrap().session,
            SessionSource::File(PathBuf::from("telegram.session"))
        );
    }

    #[test]
    fn test_missing_telegram_vars_disable_channel() {
        let without_hash = config(&[("TELEGRAM_API_ID", "1234"), ("TELEGRAM_SESSION_STRING", "abc")]).unwrap();
        assert!(without_hash.telegram.is_none());

        let without_session = config(&[("TELEGRAM_API_ID", "1234"), ("TELEGRAM_API_HASH", "hash")]).unwrap();
        assert!(without_session.telegram.is_none());
    }

    #[test]
    fn test_non_numeric_api_id_is_error() {
        let result = config(&[
            ("TELEGRAM_API_ID", "abc"),
            ("TELEGRAM_API_HASH", "hash"),
            ("TELEGRAM_SESSION_STRING", "s"),
        ]);
        assert!(matches!(result, Err(BriefingError::Config(_))));
    }

    #[test]
    fn test_secrets_are_redacted() {
        let config = config(&[
            ("COINGECKO_API_KEY", "cg-secret"),
            ("COINGECKO_VS_CURRENCY", "USD"),
            ("TELEGRAM_API_ID", "1"),
            ("TELEGRAM_API_HASH", "tg-secret"),
            ("TELEGRAM_SESSION_STRING", "session-secret"),
        ])
        .unwrap();
        assert_eq!(config.vs_currency, "usd");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
    }
}
