//! Runtime configuration.
//!
//! The configuration is an explicit value handed to each component at
//! construction. `MonitorConfig::from_env` overlays a `.env` file and then
//! the process environment on top of the defaults; `ConfigBuilder` is the
//! programmatic route.

use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Where social mentions are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialSource {
    Twitter,
    Reddit,
}

impl FromStr for SocialSource {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" => Ok(SocialSource::Twitter),
            "reddit" => Ok(SocialSource::Reddit),
            other => Err(MonitorError::configuration(format!(
                "unknown social source '{}', expected twitter or reddit",
                other
            ))
            .with_context("field", "social.source")),
        }
    }
}

/// What the batch monitor does with a failure from its fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the wrapped error to the caller.
    Propagate,
    /// Log the wrapped error and report the batch as failed.
    LogAndContinue,
}

impl FromStr for ErrorPolicy {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(ErrorPolicy::Propagate),
            "log" | "log_and_continue" => Ok(ErrorPolicy::LogAndContinue),
            other => Err(MonitorError::configuration(format!(
                "unknown error policy '{}', expected propagate or log_and_continue",
                other
            ))
            .with_context("field", "monitoring.error_policy")),
        }
    }
}

/// DEX market data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Solana token API used for on-chain metrics
    pub solana_url: String,
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub max_cache_entries: u64,
    pub rate_limit_requests_per_second: u32,
}

/// Social mentions and sentiment scorer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialApiConfig {
    pub source: SocialSource,
    pub twitter_url: String,
    pub twitter_bearer_token: Option<String>,
    pub reddit_url: String,
    pub sentiment_url: String,
    pub timeout_seconds: u64,
    pub rate_limit_requests_per_second: u32,
    /// Texts are truncated to this many characters before scoring
    pub max_text_chars: usize,
}

/// Steady-state monitoring loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub symbols: Vec<String>,
    pub interval_seconds: u64,
    pub error_policy: ErrorPolicy,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub directory: String,
    pub main_file_prefix: String,
    pub alert_file: String,
}

/// Complete configuration of the monitor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub market: MarketApiConfig,
    pub social: SocialApiConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LogConfig,
}

impl Default for MarketApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dexscreener.com/latest/dex".to_string(),
            api_key: None,
            solana_url: "https://public-api.solscan.io".to_string(),
            timeout_seconds: 10,
            cache_ttl_seconds: 300,
            max_cache_entries: 1000,
            rate_limit_requests_per_second: 5,
        }
    }
}

impl Default for SocialApiConfig {
    fn default() -> Self {
        Self {
            source: SocialSource::Twitter,
            twitter_url: "https://api.twitter.com/2".to_string(),
            twitter_bearer_token: None,
            reddit_url: "https://www.reddit.com".to_string(),
            sentiment_url: "http://127.0.0.1:8080/sentiment".to_string(),
            timeout_seconds: 10,
            rate_limit_requests_per_second: 10,
            max_text_chars: 512,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            interval_seconds: 300,
            error_policy: ErrorPolicy::LogAndContinue,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            directory: "logs".to_string(),
            main_file_prefix: "main.log".to_string(),
            alert_file: "alerts.log".to_string(),
        }
    }
}

fn collect_dotenv<R: std::io::Read>(
    iter: dotenvy::Iter<R>,
    source: &str,
) -> Result<HashMap<String, String>> {
    let vars = iter
        .collect::<std::result::Result<HashMap<_, _>, _>>()
        .map_err(|e| dotenv_error(source, e))?;
    debug!("Loaded {} variables from {}", vars.len(), source);
    Ok(vars)
}

fn dotenv_error(source: &str, error: dotenvy::Error) -> MonitorError {
    MonitorError::configuration("cannot read dotenv file")
        .with_context("field", "dotenv")
        .with_context("value", source)
        .with_source(error)
}

fn parse_var<T: FromStr>(name: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| {
        MonitorError::configuration(format!("environment variable {} is not valid", name))
            .with_context("field", name)
            .with_context("value", raw)
    })
}

/// Split a comma separated symbol list, dropping blanks.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl MonitorConfig {
    /// Defaults overlaid with `.env` (searched from the working directory
    /// upwards, optional) and the process environment. Process variables win.
    pub fn from_env() -> Result<Self> {
        let file_vars = match dotenvy::dotenv_iter() {
            Ok(iter) => collect_dotenv(iter, ".env")?,
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(dotenv_error(".env", e)),
        };
        Self::from_layers(file_vars)
    }

    /// Like [`MonitorConfig::from_env`] with an explicit dotenv file, which must exist.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let iter = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(&display, e))?;
        Self::from_layers(collect_dotenv(iter, &display)?)
    }

    fn from_layers(file_vars: HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// Defaults overlaid with values returned by `lookup`. Blank values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("DEXSCREENER_URL") {
            config.market.base_url = v;
        }
        if let Some(v) = get("DEXSCREENER_API_KEY") {
            config.market.api_key = Some(v);
        }
        if let Some(v) = get("SOLANA_API_URL") {
            config.market.solana_url = v;
        }
        if let Some(v) = get("MARKET_TIMEOUT_SECS") {
            config.market.timeout_seconds = parse_var("MARKET_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("MARKET_CACHE_TTL_SECS") {
            config.market.cache_ttl_seconds = parse_var("MARKET_CACHE_TTL_SECS", &v)?;
        }
        if let Some(v) = get("MARKET_RATE_LIMIT_RPS") {
            config.market.rate_limit_requests_per_second = parse_var("MARKET_RATE_LIMIT_RPS", &v)?;
        }

        if let Some(v) = get("SOCIAL_SOURCE") {
            config.social.source = v.parse()?;
        }
        if let Some(v) = get("TWITTER_API_URL") {
            config.social.twitter_url = v;
        }
        if let Some(v) = get("TWITTER_API_KEY") {
            config.social.twitter_bearer_token = Some(v);
        }
        if let Some(v) = get("REDDIT_API_URL") {
            config.social.reddit_url = v;
        }
        if let Some(v) = get("SENTIMENT_API_URL") {
            config.social.sentiment_url = v;
        }
        if let Some(v) = get("SOCIAL_TIMEOUT_SECS") {
            config.social.timeout_seconds = parse_var("SOCIAL_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SOCIAL_RATE_LIMIT_RPS") {
            config.social.rate_limit_requests_per_second = parse_var("SOCIAL_RATE_LIMIT_RPS", &v)?;
        }

        if let Some(v) = get("MONITOR_SYMBOLS") {
            config.monitoring.symbols = parse_symbols(&v);
        }
        if let Some(v) = get("MONITOR_INTERVAL_SECS") {
            config.monitoring.interval_seconds = parse_var("MONITOR_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("MONITOR_ERROR_POLICY") {
            config.monitoring.error_policy = v.parse()?;
        }

        if let Some(v) = get("LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = get("LOG_DIR") {
            config.logging.directory = v;
        }
        if let Some(v) = get("ALERT_LOG") {
            config.logging.alert_file = v;
        }

        Ok(config)
    }

    /// Reject configurations the monitor cannot start with.
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("market.base_url", &self.market.base_url),
            ("market.solana_url", &self.market.solana_url),
            ("social.twitter_url", &self.social.twitter_url),
            ("social.reddit_url", &self.social.reddit_url),
            ("social.sentiment_url", &self.social.sentiment_url),
        ];
        for (field, url) in urls {
            if url.trim().is_empty() {
                return Err(MonitorError::configuration("endpoint URL cannot be empty")
                    .with_context("field", field));
            }
        }
        if self.monitoring.interval_seconds == 0 {
            return Err(MonitorError::configuration("monitoring interval must be positive")
                .with_context("field", "monitoring.interval_seconds"));
        }
        if self.social.max_text_chars == 0 {
            return Err(MonitorError::configuration("max_text_chars must be positive")
                .with_context("field", "social.max_text_chars"));
        }
        Ok(())
    }
}

/// Builder for convenient construction with sensible defaults.
pub struct ConfigBuilder {
    config: MonitorConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
        }
    }

    /// Set the symbols tracked by the monitoring loop.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.monitoring.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Set the monitoring interval in seconds.
    pub fn with_interval(mut self, interval_seconds: u64) -> Self {
        self.config.monitoring.interval_seconds = interval_seconds;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.monitoring.error_policy = policy;
        self
    }

    pub fn with_market_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.market.base_url = url.into();
        self
    }

    pub fn with_market_api_key(mut self, key: Option<String>) -> Self {
        self.config.market.api_key = key;
        self
    }

    pub fn with_social_source(mut self, source: SocialSource) -> Self {
        self.config.social.source = source;
        self
    }

    pub fn with_sentiment_url(mut self, url: impl Into<String>) -> Self {
        self.config.social.sentiment_url = url.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> MonitorConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
