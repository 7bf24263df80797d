//! Shape and type checks for raw market and social payloads.
//!
//! Raw payloads arrive as `serde_json::Value` from the data clients and are
//! turned into typed snapshots here; anything that does not fit is a
//! validation error naming the offending field.

use crate::error::{MonitorError, Result};
use nonempty::NonEmpty;
use serde_json::{Map, Value};

/// Typed view of a validated market payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub name: String,
    pub price: f64,
    pub volume: f64,
    pub liquidity: f64,
    pub holders: u64,
}

/// One social post. `text` is optional: posts without it still count as
/// mentions but are skipped by sentiment scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialPost {
    pub text: Option<String>,
    pub raw: Value,
}

impl SocialPost {
    /// Text worth sending to the sentiment scorer.
    pub fn usable_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Validated social payload: always at least one post.
#[derive(Debug, Clone, PartialEq)]
pub struct SocialSnapshot {
    pub posts: NonEmpty<SocialPost>,
}

impl SocialSnapshot {
    pub fn mention_count(&self) -> u64 {
        self.posts.len() as u64
    }
}

/// Name of the JSON kind, used as the offending value in type errors.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn required<'a>(data: &'a Map<String, Value>, field: &str, symbol: &str) -> Result<&'a Value> {
    data.get(field).ok_or_else(|| {
        MonitorError::invalid_field(
            format!("missing required field '{}' for {}", field, symbol),
            format!("market_data.{}", field),
        )
    })
}

fn invalid_type(field: &str, expected: &str, found: &Value, symbol: &str) -> MonitorError {
    MonitorError::invalid_field(
        format!("invalid type for '{}' for {}: expected {}", field, symbol, expected),
        format!("market_data.{}", field),
    )
    .with_context("value", json_kind(found))
}

fn required_number(data: &Map<String, Value>, field: &str, symbol: &str) -> Result<f64> {
    let value = required(data, field, symbol)?;
    value
        .as_f64()
        .ok_or_else(|| invalid_type(field, "number", value, symbol))
}

/// Validate the market payload for `symbol`.
///
/// Requires `name` (string), `price`, `volume`, `liquidity` (numbers) and
/// `holders` (non-negative integer).
pub fn validate_market_data(symbol: &str, data: &Value) -> Result<MarketSnapshot> {
    let data = data.as_object().ok_or_else(|| {
        MonitorError::invalid_field(
            format!("market data for {} must be an object", symbol),
            "market_data",
        )
        .with_context("value", json_kind(data))
    })?;

    let name_value = required(data, "name", symbol)?;
    let name = name_value
        .as_str()
        .ok_or_else(|| invalid_type("name", "string", name_value, symbol))?
        .to_string();

    let price = required_number(data, "price", symbol)?;
    let volume = required_number(data, "volume", symbol)?;
    let liquidity = required_number(data, "liquidity", symbol)?;

    let holders_value = required(data, "holders", symbol)?;
    let holders = holders_value
        .as_u64()
        .ok_or_else(|| invalid_type("holders", "non-negative integer", holders_value, symbol))?;

    Ok(MarketSnapshot {
        name,
        price,
        volume,
        liquidity,
        holders,
    })
}

/// Validate the social payload for `symbol`.
///
/// Only a non-empty array of post objects is accepted. The single-mapping
/// `{"mentions": .., "sentiment": ..}` shape is rejected.
pub fn validate_social_data(symbol: &str, data: &Value) -> Result<SocialSnapshot> {
    let items = match data {
        Value::Array(items) => items,
        Value::Object(_) => {
            return Err(MonitorError::invalid_field(
                format!(
                    "social data for {} must be a list of posts, aggregated mappings are not accepted",
                    symbol
                ),
                "social_data",
            )
            .with_context("value", "object"))
        }
        other => {
            return Err(MonitorError::invalid_field(
                format!("social data for {} must be a list of posts", symbol),
                "social_data",
            )
            .with_context("value", json_kind(other)))
        }
    };

    let mut posts = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let post = item.as_object().ok_or_else(|| {
            MonitorError::invalid_field(
                format!("social post {} for {} is not an object", i, symbol),
                format!("social_data[{}]", i),
            )
            .with_context("value", json_kind(item))
        })?;

        let text = match post.get("text") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => {
                return Err(MonitorError::invalid_field(
                    format!("social post {} for {} has non-string text", i, symbol),
                    format!("social_data[{}].text", i),
                )
                .with_context("value", json_kind(other)))
            }
        };

        posts.push(SocialPost {
            text,
            raw: item.clone(),
        });
    }

    let posts = NonEmpty::from_vec(posts).ok_or_else(|| {
        MonitorError::invalid_field(
            format!("social data list for {} is empty", symbol),
            "social_data",
        )
        .with_context("value", "empty list")
    })?;

    Ok(SocialSnapshot { posts })
}
