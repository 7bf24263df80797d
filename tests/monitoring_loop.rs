//! Tests for the periodic monitoring loop

use async_trait::async_trait;
use meme_sentinel::analysis::{
    CoinRegistry, DexScreenerClient, MarketAnalyzer, MarketDataClient, MonitoringLoop,
    SentimentScore, SocialApiClient, SocialDataClient,
};
use meme_sentinel::config::{ConfigBuilder, MonitorConfig, SocialSource};
use meme_sentinel::{ErrorPolicy, MonitorError, Result, Signal};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Market whose volume grows with every call, so later cycles cross the buy threshold.
struct RisingMarket {
    calls: AtomicUsize,
}

#[async_trait]
impl MarketDataClient for RisingMarket {
    async fn fetch_market_data(&self, symbol: &str) -> Result<Value> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
        Ok(json!({
            "name": symbol,
            "price": 0.042,
            "volume": 400_000.0 + call * 800_000.0,
            "liquidity": 90_000.0,
            "holders": 812
        }))
    }
}

struct FixedSentiment(f64);

#[async_trait]
impl SocialDataClient for FixedSentiment {
    async fn fetch_mentions(&self, symbol: &str) -> Result<Value> {
        Ok(json!([
            {"text": format!("${} looking strong", symbol)},
            {"text": format!("{} chart update", symbol), "retweets": 4}
        ]))
    }

    async fn score_sentiment(&self, _text: &str) -> Result<SentimentScore> {
        Ok(SentimentScore::new(self.0))
    }
}

#[derive(Default)]
struct DownMarket {
    calls: AtomicUsize,
}

#[async_trait]
impl MarketDataClient for DownMarket {
    async fn fetch_market_data(&self, symbol: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MonitorError::endpoint_failure("connection refused", symbol, None))
    }
}

#[tokio::test]
async fn test_signal_changes_across_cycles() {
    let config = ConfigBuilder::new()
        .with_symbols(["MOG"])
        .with_error_policy(ErrorPolicy::Propagate)
        .build();
    let analyzer = MarketAnalyzer::new(
        RisingMarket {
            calls: AtomicUsize::new(0),
        },
        FixedSentiment(0.75),
        None,
    );
    let monitor = MonitoringLoop::new(analyzer, config.monitoring);

    // 400k volume: neither threshold
    assert!(monitor.run_cycle().await.unwrap().signals.is_empty());
    // 1.2M volume with 0.75 sentiment: buy
    let outcome = monitor.run_cycle().await.unwrap();
    assert_eq!(outcome.signals, vec![("MOG".to_string(), Signal::Buy)]);
}

#[tokio::test]
async fn test_bearish_low_volume_sells() {
    let config = ConfigBuilder::new().with_symbols(["MOG", "POPCAT"]).build();
    let analyzer = MarketAnalyzer::new(
        Arc::new(RisingMarket {
            calls: AtomicUsize::new(0),
        }),
        FixedSentiment(-0.2),
        None,
    );
    let monitor = MonitoringLoop::new(analyzer, config.monitoring);

    let outcome = monitor.run_cycle().await.unwrap();
    // first fetch is 400k, second is 1.2M; only the first sells
    assert_eq!(outcome.report.appended, 2);
    assert_eq!(outcome.signals.len(), 1);
    assert_eq!(outcome.signals[0].1, Signal::Sell);
}

#[tokio::test]
async fn test_loop_survives_failing_cycles_until_shutdown() {
    let registry = CoinRegistry::new();
    let market = Arc::new(DownMarket::default());
    let config = ConfigBuilder::new()
        .with_symbols(["DEAD"])
        .with_interval(1)
        .with_error_policy(ErrorPolicy::Propagate)
        .build();
    let analyzer = MarketAnalyzer::new(market.clone(), FixedSentiment(0.5), Some(registry.clone()));
    let monitor = MonitoringLoop::new(analyzer, config.monitoring);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let controller = async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        stop_tx.send(()).unwrap();
    };
    let shutdown = async move {
        let _ = stop_rx.await;
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(monitor.run(shutdown), controller);
    })
    .await
    .expect("loop should stop after shutdown");

    // ticks at 0s and 1s both ran despite the failures
    assert!(market.calls.load(Ordering::SeqCst) >= 2);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_http_clients_from_environment() {
    let env = [
        ("DEXSCREENER_URL", "http://127.0.0.1:9/dex/"),
        ("SOCIAL_SOURCE", "reddit"),
        ("REDDIT_API_URL", "http://127.0.0.1:9"),
        ("MONITOR_SYMBOLS", "bonk, wif"),
        ("MONITOR_ERROR_POLICY", "propagate"),
    ];
    let config = MonitorConfig::from_lookup(|key| {
        env.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap();
    config.validate().unwrap();

    assert_eq!(config.monitoring.symbols, vec!["BONK", "WIF"]);
    assert_eq!(config.social.source, SocialSource::Reddit);

    let market = DexScreenerClient::new(config.market.clone()).unwrap();
    let social = SocialApiClient::new(config.social.clone()).unwrap();
    let monitor = MonitoringLoop::new(MarketAnalyzer::new(market, social, None), config.monitoring);

    // Nothing listens on port 9: the batch fails with a wrapped connection error
    let err = monitor.run_cycle().await.unwrap_err();
    assert!(err.is_processing());
    assert!(err.context("details").unwrap().starts_with("[connection]"));
}
