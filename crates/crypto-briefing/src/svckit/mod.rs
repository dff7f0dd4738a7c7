//! Service Kit - Agent Tools
//!
//! The briefing tools served to the assistant. Each implements
//! `agent_core::Tool` and renders a fixed-format text report.

mod coin_details;
mod market_overview;
mod realtime_news;
pub mod report;

pub use coin_details::{CoinDetailsTool, render_coin};
pub use market_overview::{MarketOverview, MarketOverviewTool, WHALE_CHANNEL};
pub use realtime_news::{NEWS_CHANNELS, RealtimeNewsTool, render_news, validate_hours};
