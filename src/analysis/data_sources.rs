//! Data sources for fetching market data and social mentions.
//!
//! The analyzer only sees the [`MarketDataClient`] and [`SocialDataClient`]
//! traits. The HTTP implementations below talk to a DexScreener-style market
//! API, Twitter or Reddit search, and an external sentiment scoring service.
//! None of them retry: a failed call surfaces as a connection error.

use crate::config::{MarketApiConfig, SocialApiConfig, SocialSource};
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Source of per-symbol market snapshots.
#[async_trait]
pub trait MarketDataClient: Send + Sync {
    /// Raw market payload, expected to carry name, price, volume, liquidity and holders.
    async fn fetch_market_data(&self, symbol: &str) -> Result<Value>;
}

/// Source of social mentions plus the sentiment scorer applied to them.
#[async_trait]
pub trait SocialDataClient: Send + Sync {
    /// Raw social payload for `symbol`, normally a list of post objects.
    async fn fetch_mentions(&self, symbol: &str) -> Result<Value>;

    /// Polarity of a single text.
    async fn score_sentiment(&self, text: &str) -> Result<SentimentScore>;
}

#[async_trait]
impl<T: MarketDataClient + ?Sized> MarketDataClient for Arc<T> {
    async fn fetch_market_data(&self, symbol: &str) -> Result<Value> {
        (**self).fetch_market_data(symbol).await
    }
}

#[async_trait]
impl<T: SocialDataClient + ?Sized> SocialDataClient for Arc<T> {
    async fn fetch_mentions(&self, symbol: &str) -> Result<Value> {
        (**self).fetch_mentions(symbol).await
    }

    async fn score_sentiment(&self, text: &str) -> Result<SentimentScore> {
        (**self).score_sentiment(text).await
    }
}

/// Shortest trimmed text the sentiment service accepts.
pub const MIN_SCORABLE_CHARS: usize = 3;

/// Output of the sentiment scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Compound polarity in [-1, 1]
    pub compound: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl SentimentScore {
    pub fn new(compound: f64) -> Self {
        Self {
            compound,
            label: None,
            confidence: None,
        }
    }

    /// Reject compound scores outside [-1, 1].
    pub fn validated(self) -> Result<Self> {
        if !self.compound.is_finite() || !(-1.0..=1.0).contains(&self.compound) {
            return Err(MonitorError::invalid_field(
                "sentiment compound score must be within [-1, 1]",
                "compound",
            )
            .with_context("value", self.compound.to_string()));
        }
        Ok(self)
    }
}

fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| MonitorError::configuration("failed to build HTTP client").with_source(e))
}

fn build_rate_limiter(requests_per_second: u32) -> DefaultDirectRateLimiter {
    let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    RateLimiter::direct(Quota::per_second(per_second))
}

/// Send a request and turn any non-success outcome into a connection error.
async fn send_checked(request: RequestBuilder, endpoint: &str, service: &str) -> Result<Response> {
    let response = request.send().await.map_err(|e| {
        MonitorError::endpoint_failure(format!("{} request failed", service), endpoint, None)
            .with_source(e)
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!("{} returned {} for {}", service, status, endpoint);
        return Err(MonitorError::endpoint_failure(
            format!("{} returned a non-success status", service),
            endpoint,
            Some(status.as_u16()),
        ));
    }
    Ok(response)
}

/// Parse a configured base URL that path segments can be appended to.
fn parse_base_url(raw: &str, field: &'static str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| {
        MonitorError::configuration("invalid endpoint URL")
            .with_context("field", field)
            .with_context("value", raw)
            .with_source(e)
    })?;
    if url.cannot_be_a_base() {
        return Err(MonitorError::configuration("endpoint URL cannot take a path")
            .with_context("field", field)
            .with_context("value", raw));
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded as a single segment.
fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn decode_json(response: Response, endpoint: &str, service: &str) -> Result<Value> {
    response.json::<Value>().await.map_err(|e| {
        MonitorError::invalid_field(format!("{} response is not valid JSON", service), "response")
            .with_context("endpoint", endpoint)
            .with_source(e)
    })
}

/// Market data client for a DexScreener-style token endpoint.
pub struct DexScreenerClient {
    http_client: Client,
    config: MarketApiConfig,
    base_url: Url,
    solana_url: Url,
    rate_limiter: DefaultDirectRateLimiter,
    cache: Cache<String, Value>,
}

impl DexScreenerClient {
    pub fn new(config: MarketApiConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.base_url, "market.base_url")?;
        let solana_url = parse_base_url(&config.solana_url, "market.solana_url")?;
        let http_client = build_http_client(config.timeout_seconds)?;
        let rate_limiter = build_rate_limiter(config.rate_limit_requests_per_second);
        let cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        Ok(Self {
            http_client,
            config,
            base_url,
            solana_url,
            rate_limiter,
            cache,
        })
    }

    pub fn token_url(&self, symbol: &str) -> Url {
        join_segments(&self.base_url, &["tokens", symbol])
    }

    pub fn onchain_metrics_url(&self, contract_address: &str) -> Url {
        join_segments(&self.solana_url, &["token", contract_address, "metrics"])
    }

    /// On-chain metrics (holders, whale transactions) for a token contract.
    #[instrument(skip(self))]
    pub async fn fetch_onchain_metrics(&self, contract_address: &str) -> Result<Value> {
        if contract_address.trim().is_empty() {
            return Err(MonitorError::invalid_field("contract address is empty", "contract_address"));
        }

        let url = self.onchain_metrics_url(contract_address);
        self.rate_limiter.until_ready().await;

        let response = send_checked(self.http_client.get(url.clone()), url.as_str(), "Solana API").await?;
        let metrics = decode_json(response, url.as_str(), "Solana API").await?;
        debug!("Fetched on-chain metrics for {}", contract_address);
        Ok(metrics)
    }

    /// Last payload successfully fetched for `symbol`, if still fresh.
    pub async fn cached_market_data(&self, symbol: &str) -> Option<Value> {
        self.cache.get(symbol).await
    }
}

#[async_trait]
impl MarketDataClient for DexScreenerClient {
    #[instrument(skip(self))]
    async fn fetch_market_data(&self, symbol: &str) -> Result<Value> {
        let url = self.token_url(symbol);
        self.rate_limiter.until_ready().await;

        let mut request = self.http_client.get(url.clone());
        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = send_checked(request, url.as_str(), "market data API").await?;
        let data = decode_json(response, url.as_str(), "market data API").await?;

        if !data.is_object() {
            return Err(MonitorError::invalid_field("market data response must be an object", "response")
                .with_context("endpoint", url.as_str()));
        }

        self.cache.insert(symbol.to_string(), data.clone()).await;
        debug!("Fetched market data for {}", symbol);
        Ok(data)
    }
}

/// Social mentions client (Twitter or Reddit) plus the HTTP sentiment scorer.
pub struct SocialApiClient {
    http_client: Client,
    config: SocialApiConfig,
    twitter_url: Url,
    reddit_url: Url,
    rate_limiter: DefaultDirectRateLimiter,
}

impl SocialApiClient {
    pub fn new(config: SocialApiConfig) -> Result<Self> {
        let twitter_url = parse_base_url(&config.twitter_url, "social.twitter_url")?;
        let reddit_url = parse_base_url(&config.reddit_url, "social.reddit_url")?;
        let http_client = build_http_client(config.timeout_seconds)?;
        let rate_limiter = build_rate_limiter(config.rate_limit_requests_per_second);

        Ok(Self {
            http_client,
            config,
            twitter_url,
            reddit_url,
            rate_limiter,
        })
    }

    /// Search URL for the configured source. The symbol travels as an encoded query value.
    pub fn mentions_url(&self, symbol: &str) -> Url {
        let (mut url, key) = match self.config.source {
            SocialSource::Twitter => (
                join_segments(&self.twitter_url, &["tweets", "search", "recent"]),
                "query",
            ),
            SocialSource::Reddit => (join_segments(&self.reddit_url, &["search.json"]), "q"),
        };
        url.query_pairs_mut().append_pair(key, symbol);
        url
    }

    async fn fetch_twitter(&self, symbol: &str) -> Result<Value> {
        let url = self.mentions_url(symbol);
        let mut request = self.http_client.get(url.clone());
        if let Some(token) = &self.config.twitter_bearer_token {
            request = request.bearer_auth(token);
        }

        let response = send_checked(request, url.as_str(), "Twitter API").await?;
        let body = decode_json(response, url.as_str(), "Twitter API").await?;
        Ok(normalize_twitter(body))
    }

    async fn fetch_reddit(&self, symbol: &str) -> Result<Value> {
        let url = self.mentions_url(symbol);
        let request = self
            .http_client
            .get(url.clone())
            .header(reqwest::header::USER_AGENT, "meme-sentinel/0.1");

        let response = send_checked(request, url.as_str(), "Reddit API").await?;
        let body = decode_json(response, url.as_str(), "Reddit API").await?;
        Ok(normalize_reddit(body))
    }
}

/// Twitter wraps tweets in `data`; an empty search omits it entirely.
pub fn normalize_twitter(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("meta") || map.contains_key("data") => {
            map.remove("data").unwrap_or_else(|| Value::Array(Vec::new()))
        }
        other => other,
    }
}

/// Flatten a Reddit listing into `{"text": title + selftext}` posts.
pub fn normalize_reddit(body: Value) -> Value {
    let children = match body.pointer("/data/children").and_then(Value::as_array) {
        Some(children) => children,
        None => return body,
    };

    let posts = children
        .iter()
        .filter_map(|child| child.get("data"))
        .map(|post| {
            let title = post.get("title").and_then(Value::as_str).unwrap_or_default();
            let body = post.get("selftext").and_then(Value::as_str).unwrap_or_default();
            let text = format!("{} {}", title, body).trim().to_string();
            json!({
                "text": text,
                "title": title,
                "created_utc": post.get("created_utc").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    Value::Array(posts)
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl SocialDataClient for SocialApiClient {
    #[instrument(skip(self))]
    async fn fetch_mentions(&self, symbol: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;
        let mentions = match self.config.source {
            SocialSource::Twitter => self.fetch_twitter(symbol).await?,
            SocialSource::Reddit => self.fetch_reddit(symbol).await?,
        };
        debug!(
            "Fetched {} social posts for {}",
            mentions.as_array().map(|a| a.len()).unwrap_or(0),
            symbol
        );
        Ok(mentions)
    }

    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn score_sentiment(&self, text: &str) -> Result<SentimentScore> {
        if text.trim().chars().count() < MIN_SCORABLE_CHARS {
            return Err(MonitorError::invalid_field("text too short for sentiment analysis", "text")
                .with_context("value", text));
        }

        self.rate_limiter.until_ready().await;
        let url = &self.config.sentiment_url;
        let body = json!({ "text": truncate_chars(text, self.config.max_text_chars) });
        let request = self.http_client.post(url).json(&body);

        let response = send_checked(request, url, "sentiment API").await?;
        let score: SentimentScore = response.json().await.map_err(|e| {
            MonitorError::invalid_field("sentiment response lacks a compound score", "compound")
                .with_context("endpoint", url.clone())
                .with_source(e)
        })?;

        score.validated()
    }
}
