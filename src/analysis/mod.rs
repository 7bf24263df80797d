//! Analysis module - market/social data collection and trading signals
//!
//! This module contains the data source clients, payload validation, the
//! in-memory coin registry, the analyzer pipeline, technical indicators,
//! opportunity detection and the periodic monitoring loop.

pub mod data_sources;
pub mod validation;
pub mod registry;
pub mod analyzer;
pub mod indicators;
pub mod signals;
pub mod alerts;
pub mod monitor;

// Re-export client seams and payload types
pub use data_sources::{
    DexScreenerClient, MarketDataClient, SentimentScore, SocialApiClient, SocialDataClient,
};
pub use validation::{
    validate_market_data, validate_social_data, MarketSnapshot, SocialPost, SocialSnapshot,
};

// Re-export key components
pub use registry::CoinRegistry;
pub use analyzer::{MarketAnalyzer, MonitoringReport};
pub use indicators::{apply_technical_analysis, PriceHistory, TechnicalIndicators};
pub use signals::{classify, detect_opportunities};
pub use alerts::signal_message;
pub use monitor::{CycleOutcome, MonitoringLoop};
