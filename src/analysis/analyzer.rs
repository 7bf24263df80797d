//! Market analyzer - orchestrates fetch, validation, sentiment aggregation and
//! registration for one or many symbols.
//!
//! The batch entry point fans out one pipeline per distinct symbol on the
//! current task and waits for all of them. The fan-out is fail-fast: the first
//! failing pipeline aborts the batch and drops the ones still in flight.
//! Records already appended by finished pipelines stay in the registry.

use crate::analysis::data_sources::{MarketDataClient, SentimentScore, SocialDataClient};
use crate::analysis::indicators::{self, PriceHistory, TechnicalIndicators};
use crate::analysis::registry::CoinRegistry;
use crate::analysis::signals;
use crate::analysis::validation::{validate_market_data, validate_social_data, SocialSnapshot};
use crate::config::ErrorPolicy;
use crate::error::{MonitorError, Result};
use crate::types::{CoinRecord, Signal};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringReport {
    /// Symbols passed in, duplicates included
    pub requested: usize,
    /// Distinct symbols that got a pipeline
    pub distinct: usize,
    /// Records this batch appended to the registry
    pub appended: usize,
    /// The appended records, in completion order
    pub records: Vec<CoinRecord>,
    /// Rendered batch error, set only under `ErrorPolicy::LogAndContinue`
    pub error: Option<String>,
}

impl MonitoringReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Combined market/social analyzer.
///
/// Client types are fixed by the trait bounds, so an analyzer can only be
/// built from recognised market and social clients.
pub struct MarketAnalyzer<M, S> {
    market: M,
    social: S,
    registry: CoinRegistry,
}

impl<M, S> MarketAnalyzer<M, S>
where
    M: MarketDataClient,
    S: SocialDataClient,
{
    /// Create an analyzer. A fresh empty registry is used when none is given.
    pub fn new(market: M, social: S, registry: Option<CoinRegistry>) -> Self {
        Self {
            market,
            social,
            registry: registry.unwrap_or_default(),
        }
    }

    pub fn registry(&self) -> &CoinRegistry {
        &self.registry
    }

    /// Run the per-symbol pipeline for every distinct symbol concurrently.
    ///
    /// Under `ErrorPolicy::LogAndContinue` a failed batch still returns `Ok`,
    /// with the error rendered into the report; check
    /// [`MonitoringReport::is_success`].
    #[instrument(skip(self, symbols), fields(requested = symbols.len()))]
    pub async fn realtime_monitoring(
        &self,
        symbols: &[String],
        policy: ErrorPolicy,
    ) -> Result<MonitoringReport> {
        if symbols.is_empty() {
            return Err(MonitorError::invalid_field("symbol list is empty", "symbols")
                .with_context("value", "[]"));
        }

        let distinct: HashSet<&str> = symbols.iter().map(String::as_str).collect();
        debug!("Monitoring {} distinct symbols", distinct.len());

        // Fail-fast: the first error drops the pipelines still in flight
        let mut pending: FuturesUnordered<_> = distinct
            .iter()
            .map(|symbol| self.process_memecoin(symbol))
            .collect();
        let mut records = Vec::with_capacity(distinct.len());
        let mut failure = None;
        while let Some(result) = pending.next().await {
            match result {
                Ok(record) => records.push(record),
                Err(cause) => {
                    failure = Some(cause);
                    break;
                }
            }
        }
        drop(pending);

        let appended = records.len();
        let mut report = MonitoringReport {
            requested: symbols.len(),
            distinct: distinct.len(),
            appended,
            records,
            error: None,
        };

        match failure {
            None => {
                info!("Batch complete: {} records registered", appended);
                Ok(report)
            }
            Some(cause) => {
                let wrapped = MonitorError::processing("failed to collect market or social data")
                    .with_context("component", "realtime_monitoring")
                    .with_context("details", cause.to_string())
                    .with_source(cause);

                match policy {
                    ErrorPolicy::Propagate => Err(wrapped),
                    ErrorPolicy::LogAndContinue => {
                        warn!(appended, "Batch aborted: {}", wrapped);
                        report.error = Some(wrapped.to_string());
                        Ok(report)
                    }
                }
            }
        }
    }

    /// Fetch, validate, score and register a single symbol.
    #[instrument(skip(self))]
    pub async fn process_memecoin(&self, symbol: &str) -> Result<CoinRecord> {
        let (market_data, social_data) = tokio::join!(
            self.market.fetch_market_data(symbol),
            self.social.fetch_mentions(symbol)
        );
        let market_data = market_data?;
        let social_data = social_data?;

        validate_market_data(symbol, &market_data)?;
        let social = validate_social_data(symbol, &social_data)?;

        let sentiment = self.calculate_sentiment_score(&social).await?;
        let record = CoinRecord::from_market_payload(
            symbol,
            &market_data,
            social.mention_count(),
            Some(sentiment),
        )?;

        self.registry.append(record.clone()).await;
        info!(summary = ?record.summary(), "Memecoin processed: {}", symbol);
        Ok(record)
    }

    /// Mean compound score over posts with usable text, rounded to 4 decimals.
    ///
    /// Posts without text are skipped. A scorer failure aborts with a
    /// processing error naming the post. Returns 0.0 when nothing was scored.
    pub async fn calculate_sentiment_score(&self, social: &SocialSnapshot) -> Result<f64> {
        let mut scores = Vec::with_capacity(social.posts.len());

        for (index, post) in social.posts.iter().enumerate() {
            let Some(text) = post.usable_text() else {
                warn!("Skipping social post {} without text", index);
                continue;
            };

            match self
                .social
                .score_sentiment(text)
                .await
                .and_then(SentimentScore::validated)
            {
                Ok(score) => scores.push(score.compound),
                Err(cause) => {
                    error!("Sentiment scoring failed for post {}: {}", index, cause);
                    return Err(MonitorError::processing("sentiment analysis failed")
                        .with_context("component", "sentiment_scorer")
                        .with_context("input", post.raw.to_string())
                        .with_context("details", cause.to_string())
                        .with_source(cause));
                }
            }
        }

        if scores.is_empty() {
            debug!("No scorable social posts, sentiment defaults to 0.0");
            return Ok(0.0);
        }

        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        Ok((mean * 10_000.0).round() / 10_000.0)
    }

    /// Latest RSI, MACD and Bollinger values for a price history.
    pub fn apply_technical_analysis(&self, history: &PriceHistory) -> Result<TechnicalIndicators> {
        indicators::apply_technical_analysis(history)
    }

    /// Buy/sell/hold classification of one record.
    pub fn detect_opportunities(&self, record: &CoinRecord) -> Result<Option<Signal>> {
        signals::detect_opportunities(record)
    }
}
