//! Technical indicators over a closing-price history.
//!
//! The indicator math itself comes from the `ta` crate; this module only
//! prepares the series (gap filling, length checks) and picks the latest
//! value of each indicator.

use crate::error::{MonitorError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use ta::indicators::{BollingerBands, MovingAverageConvergenceDivergence, RelativeStrengthIndex};
use ta::Next;
use tracing::{debug, instrument};

/// Minimum number of rows accepted by [`apply_technical_analysis`].
pub const MIN_HISTORY_ROWS: usize = 14;
pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULTIPLIER: f64 = 2.0;

const CLOSE_COLUMN: &str = "close";

/// Price history table: named numeric columns of equal length. `None` (or NaN)
/// marks a gap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    rows: usize,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a single, gap-free `close` column.
    pub fn from_closes(closes: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<Option<f64>> = closes.into_iter().map(Some).collect();
        Self {
            rows: values.len(),
            columns: BTreeMap::from([(CLOSE_COLUMN.to_string(), values)]),
        }
    }

    /// Add a column. Every column must have the same number of rows.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.rows {
            return Err(MonitorError::invalid_field(
                format!("column '{}' has {} rows, table has {}", name, values.len(), self.rows),
                format!("historical_data.{}", name),
            ));
        }
        self.rows = values.len();
        self.columns.insert(name, values);
        Ok(self)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }
}

/// Latest value of each indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TechnicalIndicators {
    pub rsi: f64,
    pub macd: f64,
    pub bollinger_upper: f64,
    pub bollinger_lower: f64,
}

/// Forward-fill then backward-fill gaps. Returns `None` if any gap remains.
pub fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let mut filled: Vec<Option<f64>> = values
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();

    let mut last = None;
    for slot in filled.iter_mut() {
        if slot.is_some() {
            last = *slot;
        } else {
            *slot = last;
        }
    }

    let mut next = None;
    for slot in filled.iter_mut().rev() {
        if slot.is_some() {
            next = *slot;
        } else {
            *slot = next;
        }
    }

    filled.into_iter().collect()
}

fn series_summary(closes: &[f64]) -> String {
    let count = closes.len();
    let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mean = closes.iter().sum::<f64>() / count.max(1) as f64;
    let last = closes.last().copied().unwrap_or(f64::NAN);
    format!(
        "count={} min={:.6} max={:.6} mean={:.6} last={:.6}",
        count, min, max, mean, last
    )
}

fn indicator_failure(metric: &str, algorithm: &str, closes: &[f64], cause: String) -> MonitorError {
    MonitorError::analysis(format!("failed to compute {}", metric))
        .with_context("component", "technical_analysis")
        .with_context("metric", metric)
        .with_context("algorithm", algorithm)
        .with_context("input_stats", series_summary(closes))
        .with_context("cause", cause)
}

fn finite_or_fail(value: f64, metric: &str, algorithm: &str, closes: &[f64]) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(indicator_failure(metric, algorithm, closes, format!("non-finite result {}", value)))
    }
}

fn compute(closes: &[f64]) -> Result<TechnicalIndicators> {
    let rsi_algo = format!("RSI({})", RSI_PERIOD);
    let macd_algo = format!("MACD({},{},{})", MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bb_algo = format!("BollingerBands({},{})", BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER);

    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
        .map_err(|e| indicator_failure("rsi", &rsi_algo, closes, format!("{:?}", e)))?;
    let mut macd = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
        .map_err(|e| indicator_failure("macd", &macd_algo, closes, format!("{:?}", e)))?;
    let mut bands = BollingerBands::new(BOLLINGER_PERIOD, BOLLINGER_MULTIPLIER)
        .map_err(|e| indicator_failure("bollinger_bands", &bb_algo, closes, format!("{:?}", e)))?;

    let mut last_rsi = f64::NAN;
    let mut last_macd = f64::NAN;
    let mut last_upper = f64::NAN;
    let mut last_lower = f64::NAN;
    for &close in closes {
        last_rsi = rsi.next(close);
        last_macd = macd.next(close).macd;
        let band = bands.next(close);
        last_upper = band.upper;
        last_lower = band.lower;
    }

    Ok(TechnicalIndicators {
        rsi: finite_or_fail(last_rsi, "rsi", &rsi_algo, closes)?,
        macd: finite_or_fail(last_macd, "macd", &macd_algo, closes)?,
        bollinger_upper: finite_or_fail(last_upper, "bollinger_upper", &bb_algo, closes)?,
        bollinger_lower: finite_or_fail(last_lower, "bollinger_lower", &bb_algo, closes)?,
    })
}

/// RSI(14), MACD line and Bollinger(20) bands for the latest close.
#[instrument(skip(history), fields(rows = history.row_count()))]
pub fn apply_technical_analysis(history: &PriceHistory) -> Result<TechnicalIndicators> {
    if history.row_count() < MIN_HISTORY_ROWS {
        return Err(MonitorError::invalid_field(
            format!(
                "insufficient history ({} rows, need {})",
                history.row_count(),
                MIN_HISTORY_ROWS
            ),
            "historical_data.index",
        )
        .with_context("value", history.row_count().to_string()));
    }

    let raw = history.column(CLOSE_COLUMN).ok_or_else(|| {
        MonitorError::invalid_field("column 'close' is missing", "historical_data.columns")
            .with_context("value", history.column_names().join(","))
    })?;

    let closes = fill_gaps(raw).ok_or_else(|| {
        MonitorError::invalid_field(
            "close series still has gaps after filling",
            "historical_data.close",
        )
    })?;

    let indicators = compute(&closes)?;
    debug!(
        "Indicators: rsi={:.2} macd={:.4} bb_upper={:.4} bb_lower={:.4}",
        indicators.rsi, indicators.macd, indicators.bollinger_upper, indicators.bollinger_lower
    );
    Ok(indicators)
}
