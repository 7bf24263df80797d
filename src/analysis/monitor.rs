//! Steady-state monitoring loop.
//!
//! Each cycle runs the batch pipeline over the configured symbols, then checks
//! every record that batch produced for a buy or sell opportunity.
//! Signals are only reported through the alert log target, never executed.

use crate::analysis::alerts::signal_message;
use crate::analysis::analyzer::{MarketAnalyzer, MonitoringReport};
use crate::analysis::data_sources::{MarketDataClient, SocialDataClient};
use crate::config::MonitoringConfig;
use crate::error::Result;
use crate::logging::ALERT_TARGET;
use crate::types::Signal;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// Result of a single monitoring cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub report: MonitoringReport,
    /// Buy/sell signals raised this cycle, keyed by symbol
    pub signals: Vec<(String, Signal)>,
}

pub struct MonitoringLoop<M, S> {
    analyzer: MarketAnalyzer<M, S>,
    config: MonitoringConfig,
}

impl<M, S> MonitoringLoop<M, S>
where
    M: MarketDataClient,
    S: SocialDataClient,
{
    pub fn new(analyzer: MarketAnalyzer<M, S>, config: MonitoringConfig) -> Self {
        Self { analyzer, config }
    }

    pub fn analyzer(&self) -> &MarketAnalyzer<M, S> {
        &self.analyzer
    }

    /// Run one batch and evaluate the records it produced.
    #[instrument(skip(self), fields(symbols = self.config.symbols.len()))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let report = self
            .analyzer
            .realtime_monitoring(&self.config.symbols, self.config.error_policy)
            .await?;

        let mut signals = Vec::new();
        for record in &report.records {
            match self.analyzer.detect_opportunities(record) {
                Ok(Some(signal)) => {
                    let message =
                        signal_message(record.symbol(), record.price(), Utc::now(), signal.as_str());
                    info!(target: ALERT_TARGET, symbol = record.symbol(), "{}", message);
                    signals.push((record.symbol().to_string(), signal));
                }
                Ok(None) => debug!("{}: hold", record.symbol()),
                Err(e) => warn!("Opportunity detection failed for {}: {}", record.symbol(), e),
            }
        }

        Ok(CycleOutcome { report, signals })
    }

    /// Run cycles every `interval_seconds` until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Monitoring {} symbols every {}s",
            self.config.symbols.len(),
            self.config.interval_seconds
        );

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping monitoring loop");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_cycle().await {
                        Ok(outcome) if outcome.report.is_success() => info!(
                            "Cycle complete: {} records, {} signals",
                            outcome.report.appended,
                            outcome.signals.len()
                        ),
                        Ok(outcome) => warn!(
                            "Cycle finished with errors: {} records, {} signals",
                            outcome.report.appended,
                            outcome.signals.len()
                        ),
                        Err(e) => error!("Monitoring cycle failed: {}", e),
                    }
                }
            }
        }
    }
}
