//! Report Building Blocks
//!
//! Shared helpers for the text briefings: per-source fetch outcomes and
//! the small formatting rules every report follows.

use rust_decimal::Decimal;

use crate::error::BriefingError;

/// Outcome of one sub-fetch of a composite report
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    Failed { source: &'static str, reason: String },
}

impl<T> Fetched<T> {
    /// Wrap a fetch result, logging the failure
    pub fn from_result(source: &'static str, result: Result<T, BriefingError>) -> Self {
        match result {
            Ok(value) => Fetched::Ready(value),
            Err(e) => {
                tracing::warn!(source, error = %e, "Sub-fetch failed");
                Fetched::Failed {
                    source,
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetched::Ready(value) => Some(value),
            Fetched::Failed { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Fetched::Ready(_))
    }
}

/// Message text on a single line
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display symbol for a quote currency code
pub fn currency_symbol(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "krw" => "₩".into(),
        "usd" => "$".into(),
        "eur" => "€".into(),
        "jpy" => "¥".into(),
        "gbp" => "£".into(),
        other => format!("{} ", other.to_uppercase()),
    }
}

/// Price with thousands separators and no trailing zeros
pub fn format_price(price: Decimal) -> String {
    let plain = price.normalize().to_string();
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}
