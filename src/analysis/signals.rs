//! Buy/sell opportunity detection on a single coin snapshot.
//!
//! Stateless: the decision is a pure function of the sentiment score and the
//! 24h volume, with fixed thresholds.

use crate::error::{MonitorError, Result};
use crate::types::{CoinRecord, Signal};
use tracing::debug;

pub const BUY_MIN_SENTIMENT: f64 = 0.7;
pub const BUY_MIN_VOLUME: f64 = 1_000_000.0;
pub const SELL_MAX_SENTIMENT: f64 = 0.3;
pub const SELL_MAX_VOLUME: f64 = 500_000.0;

/// Classify a (sentiment, volume) pair. `Ok(None)` means hold.
pub fn classify(sentiment_score: f64, volume_24h: f64) -> Result<Option<Signal>> {
    if !sentiment_score.is_finite() || !volume_24h.is_finite() {
        return Err(MonitorError::analysis("invalid numeric input for opportunity detection")
            .with_context("component", "opportunity_detection")
            .with_context("sentiment_score", sentiment_score.to_string())
            .with_context("volume_24h", volume_24h.to_string()));
    }

    if sentiment_score > BUY_MIN_SENTIMENT && volume_24h > BUY_MIN_VOLUME {
        return Ok(Some(Signal::Buy));
    }
    if sentiment_score < SELL_MAX_SENTIMENT && volume_24h < SELL_MAX_VOLUME {
        return Ok(Some(Signal::Sell));
    }
    Ok(None)
}

/// Detect a trading opportunity for a constructed record.
///
/// Fails with a validation error when the record has no sentiment score.
pub fn detect_opportunities(record: &CoinRecord) -> Result<Option<Signal>> {
    let sentiment = record.sentiment_score().ok_or_else(|| {
        MonitorError::invalid_field(
            format!("{} has no sentiment score", record.symbol()),
            "sentiment_score",
        )
        .with_context("symbol", record.symbol())
    })?;

    let signal = classify(sentiment, record.volume_24h())?;
    debug!(
        "{}: sentiment={:.4} volume={:.2} -> {}",
        record.symbol(),
        sentiment,
        record.volume_24h(),
        Signal::label(signal)
    );
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sentiment: Option<f64>, volume: f64) -> CoinRecord {
        CoinRecord::new("TEST", "Test Coin", 100.0, volume, 1_000_000.0, 1000, 50, sentiment).unwrap()
    }

    #[test]
    fn test_decision_thresholds() {
        let cases = [
            (0.75, 1_500_000.0, Some(Signal::Buy)),
            (0.25, 400_000.0, Some(Signal::Sell)),
            (0.5, 750_000.0, None),
            (0.8, 900_000.0, None),
            (0.4, 1_100_000.0, None),
        ];

        for (sentiment, volume, expected) in cases {
            assert_eq!(classify(sentiment, volume).unwrap(), expected, "({}, {})", sentiment, volume);
            assert_eq!(detect_opportunities(&record(Some(sentiment), volume)).unwrap(), expected);
        }
    }

    #[test]
    fn test_thresholds_are_strict() {
        assert_eq!(classify(0.7, 2_000_000.0).unwrap(), None);
        assert_eq!(classify(0.9, 1_000_000.0).unwrap(), None);
        assert_eq!(classify(0.3, 100.0).unwrap(), None);
        assert_eq!(classify(0.1, 500_000.0).unwrap(), None);
    }

    #[test]
    fn test_negative_sentiment_low_volume_sells() {
        assert_eq!(classify(-0.9, 0.0).unwrap(), Some(Signal::Sell));
    }

    #[test]
    fn test_missing_sentiment_is_validation_error() {
        let err = detect_opportunities(&record(None, 500_000.0)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.context("field"), Some("sentiment_score"));
    }

    #[test]
    fn test_non_finite_input_is_analysis_error() {
        let err = classify(f64::NAN, 1.0).unwrap_err();
        assert!(err.is_analysis());
        assert_eq!(err.context("component"), Some("opportunity_detection"));

        assert!(classify(0.5, f64::INFINITY).unwrap_err().is_analysis());
    }
}
