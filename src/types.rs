//! Core types and data structures for the meme-sentinel monitoring system.

use crate::analysis::validation::validate_market_data;
use crate::error::{MonitorError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Default sentiment level considered "high".
pub const DEFAULT_HIGH_SENTIMENT: f64 = 0.7;

/// Validated snapshot of one symbol's market and social metrics.
///
/// Built once from one market payload and one social payload and never
/// mutated afterwards; indicator and signal logic only read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinRecord {
    symbol: String,
    name: String,
    price: f64,
    volume_24h: f64,
    liquidity: f64,
    holders: u64,
    social_mentions: u64,
    sentiment_score: Option<f64>,
}

impl CoinRecord {
    /// Create a record, rejecting values outside their domain.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        volume_24h: f64,
        liquidity: f64,
        holders: u64,
        social_mentions: u64,
        sentiment_score: Option<f64>,
    ) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(MonitorError::invalid_field("symbol cannot be empty", "symbol"));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(MonitorError::invalid_field("price must be a positive number", "price")
                .with_context("value", price.to_string()));
        }
        check_non_negative("volume_24h", volume_24h)?;
        check_non_negative("liquidity", liquidity)?;
        if let Some(score) = sentiment_score {
            if !score.is_finite() || !(-1.0..=1.0).contains(&score) {
                return Err(MonitorError::invalid_field(
                    "sentiment score must be within [-1, 1]",
                    "sentiment_score",
                )
                .with_context("value", score.to_string()));
            }
        }

        Ok(Self {
            symbol,
            name: name.into(),
            price,
            volume_24h,
            liquidity,
            holders,
            social_mentions,
            sentiment_score,
        })
    }

    /// Build a record straight from a raw market payload.
    ///
    /// The payload is re-validated here even when the caller already did so,
    /// so a record can never be built from a payload lacking a market field.
    pub fn from_market_payload(
        symbol: &str,
        market_payload: &Value,
        social_mentions: u64,
        sentiment_score: Option<f64>,
    ) -> Result<Self> {
        let market = validate_market_data(symbol, market_payload)?;
        Self::new(
            symbol,
            market.name,
            market.price,
            market.volume,
            market.liquidity,
            market.holders,
            social_mentions,
            sentiment_score,
        )
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume_24h(&self) -> f64 {
        self.volume_24h
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn holders(&self) -> u64 {
        self.holders
    }

    pub fn social_mentions(&self) -> u64 {
        self.social_mentions
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment_score
    }

    pub fn is_high_volume(&self, min_volume: f64) -> bool {
        self.volume_24h >= min_volume
    }

    pub fn is_high_liquidity(&self, min_liquidity: f64) -> bool {
        self.liquidity >= min_liquidity
    }

    /// False when no sentiment score is available.
    pub fn is_high_sentiment(&self, min_sentiment: f64) -> bool {
        self.sentiment_score
            .map(|score| score >= min_sentiment)
            .unwrap_or(false)
    }

    /// Flat key/value view used as structured log context.
    pub fn summary(&self) -> BTreeMap<&'static str, String> {
        let mut summary = BTreeMap::new();
        summary.insert("symbol", self.symbol.clone());
        summary.insert("name", self.name.clone());
        summary.insert("price", self.price.to_string());
        summary.insert("volume_24h", self.volume_24h.to_string());
        summary.insert("liquidity", self.liquidity.to_string());
        summary.insert("holders", self.holders.to_string());
        summary.insert("social_mentions", self.social_mentions.to_string());
        summary.insert(
            "sentiment_score",
            self.sentiment_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
        );
        summary
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(MonitorError::invalid_field(
            format!("{} must be a non-negative number", field),
            field,
        )
        .with_context("value", value.to_string()));
    }
    Ok(())
}

impl fmt::Display for CoinRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - Price: ${:.4} | 24h Volume: ${} | Liquidity: ${} | Holders: {} | Mentions: {}",
            self.symbol,
            self.name,
            self.price,
            group_thousands(&format!("{:.2}", self.volume_24h)),
            group_thousands(&format!("{:.2}", self.liquidity)),
            group_thousands(&self.holders.to_string()),
            group_thousands(&self.social_mentions.to_string()),
        )
    }
}

/// Insert `,` separators into the integer part of a formatted number.
fn group_thousands(formatted: &str) -> String {
    let (int_part, frac_part) = match formatted.find('.') {
        Some(idx) => formatted.split_at(idx),
        None => (formatted, ""),
    };
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(formatted.len() + digits.len() / 3);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    grouped.push_str(frac_part);
    grouped
}

/// Trading signal emitted by opportunity detection. `None` means hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "buy",
            Signal::Sell => "sell",
        }
    }

    /// Render an optional signal, mapping the absence of one to `"hold"`.
    pub fn label(signal: Option<Signal>) -> &'static str {
        signal.map(|s| s.as_str()).unwrap_or("hold")
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> CoinRecord {
        CoinRecord::new("SOL", "Solana", 150.0, 2_000_000.0, 1_000_000.0, 10_000, 2, Some(0.8))
            .unwrap()
    }

    #[test]
    fn test_round_trip_fields() {
        let record = sample_record();

        assert_eq!(record.symbol(), "SOL");
        assert_eq!(record.name(), "Solana");
        assert_eq!(record.price(), 150.0);
        assert_eq!(record.volume_24h(), 2_000_000.0);
        assert_eq!(record.liquidity(), 1_000_000.0);
        assert_eq!(record.holders(), 10_000);
        assert_eq!(record.social_mentions(), 2);
        assert_eq!(record.sentiment_score(), Some(0.8));
    }

    #[test]
    fn test_rejects_empty_symbol() {
        let err = CoinRecord::new("  ", "Nothing", 1.0, 0.0, 0.0, 0, 0, None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context("field"), Some("symbol"));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let err = CoinRecord::new("SOL", "Solana", 0.0, 0.0, 0.0, 0, 0, None).unwrap_err();
        assert_eq!(err.context("field"), Some("price"));

        let err = CoinRecord::new("SOL", "Solana", f64::NAN, 0.0, 0.0, 0, 0, None).unwrap_err();
        assert_eq!(err.context("field"), Some("price"));
    }

    #[test]
    fn test_rejects_negative_volume_and_liquidity() {
        let err = CoinRecord::new("SOL", "Solana", 1.0, -5.0, 0.0, 0, 0, None).unwrap_err();
        assert_eq!(err.context("field"), Some("volume_24h"));

        let err = CoinRecord::new("SOL", "Solana", 1.0, 5.0, -1.0, 0, 0, None).unwrap_err();
        assert_eq!(err.context("field"), Some("liquidity"));
    }

    #[test]
    fn test_rejects_out_of_range_sentiment() {
        let err = CoinRecord::new("SOL", "Solana", 1.0, 0.0, 0.0, 0, 0, Some(1.5)).unwrap_err();
        assert_eq!(err.context("field"), Some("sentiment_score"));
    }

    #[test]
    fn test_from_market_payload_coerces_numbers() {
        let payload = json!({
            "name": "Solana",
            "price": 150,
            "volume": 2_000_000,
            "liquidity": 1_000_000.5,
            "holders": 10_000
        });

        let record = CoinRecord::from_market_payload("SOL", &payload, 3, Some(0.25)).unwrap();
        assert_eq!(record.price(), 150.0);
        assert_eq!(record.volume_24h(), 2_000_000.0);
        assert_eq!(record.liquidity(), 1_000_000.5);
        assert_eq!(record.holders(), 10_000);
        assert_eq!(record.social_mentions(), 3);
    }

    #[test]
    fn test_from_market_payload_names_missing_field() {
        let payload = json!({
            "name": "Solana",
            "price": 150.0,
            "volume": 2_000_000.0,
            "holders": 10_000
        });

        let err = CoinRecord::from_market_payload("SOL", &payload, 0, None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context("field"), Some("market_data.liquidity"));
    }

    #[test]
    fn test_threshold_helpers() {
        let record = sample_record();
        assert!(record.is_high_volume(1_000_000.0));
        assert!(!record.is_high_liquidity(5_000_000.0));
        assert!(record.is_high_sentiment(DEFAULT_HIGH_SENTIMENT));

        let unscored = CoinRecord::new("SOL", "Solana", 1.0, 0.0, 0.0, 0, 0, None).unwrap();
        assert!(!unscored.is_high_sentiment(-1.0));
    }

    #[test]
    fn test_display_groups_thousands() {
        let rendered = sample_record().to_string();
        assert_eq!(
            rendered,
            "SOL (Solana) - Price: $150.0000 | 24h Volume: $2,000,000.00 | Liquidity: $1,000,000.00 | Holders: 10,000 | Mentions: 2"
        );
    }

    #[test]
    fn test_signal_labels() {
        assert_eq!(Signal::label(Some(Signal::Buy)), "buy");
        assert_eq!(Signal::label(Some(Signal::Sell)), "sell");
        assert_eq!(Signal::label(None), "hold");
    }
}
