//! Main entry point for the meme-sentinel monitor
//!
//! Symbols given on the command line replace `MONITOR_SYMBOLS`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use meme_sentinel::analysis::{DexScreenerClient, MarketAnalyzer, MonitoringLoop, SocialApiClient};
use meme_sentinel::config::{parse_symbols, MonitorConfig};
use meme_sentinel::logging::init_logging;
use meme_sentinel::ErrorPolicy;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "meme-sentinel", version)]
#[command(about = "Monitor memecoin markets and social sentiment, alerting on buy/sell signals")]
struct Cli {
    /// Symbols to monitor, space or comma separated (overrides MONITOR_SYMBOLS)
    #[arg(value_name = "SYMBOL")]
    symbols: Vec<String>,

    /// Seconds between monitoring cycles (overrides MONITOR_INTERVAL_SECS)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Batch error policy: propagate or log (overrides MONITOR_ERROR_POLICY)
    #[arg(long)]
    error_policy: Option<ErrorPolicy>,
}

impl Cli {
    fn apply(&self, config: &mut MonitorConfig) {
        let symbols: Vec<String> = self.symbols.iter().flat_map(|arg| parse_symbols(arg)).collect();
        if !symbols.is_empty() {
            config.monitoring.symbols = symbols;
        }
        if let Some(interval) = self.interval {
            config.monitoring.interval_seconds = interval;
        }
        if let Some(policy) = self.error_policy {
            config.monitoring.error_policy = policy;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MonitorConfig::from_env().context("failed to read configuration")?;
    cli.apply(&mut config);

    config.validate().context("invalid configuration")?;
    if config.monitoring.symbols.is_empty() {
        bail!("no symbols to monitor: pass them as arguments or set MONITOR_SYMBOLS");
    }

    // Guards flush the file writers on drop
    let _log_guards = init_logging(&config.logging).context("failed to initialise logging")?;

    info!("Starting meme-sentinel");
    info!(
        "Symbols: {} | source: {:?} | policy: {:?}",
        config.monitoring.symbols.join(","),
        config.social.source,
        config.monitoring.error_policy
    );

    let market = DexScreenerClient::new(config.market.clone()).context("failed to build market client")?;
    let social = SocialApiClient::new(config.social.clone()).context("failed to build social client")?;
    let analyzer = MarketAnalyzer::new(market, social, None);
    let monitor = MonitoringLoop::new(analyzer, config.monitoring.clone());

    monitor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("meme-sentinel stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_and_version_are_not_symbols() {
        let help = Cli::try_parse_from(["meme-sentinel", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);

        let version = Cli::try_parse_from(["meme-sentinel", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);

        let unknown = Cli::try_parse_from(["meme-sentinel", "--bogus"]).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_symbols_override_config() {
        let cli = Cli::try_parse_from(["meme-sentinel", "bonk,wif", "pepe", "-i", "60", "--error-policy", "propagate"])
            .unwrap();
        let mut config = MonitorConfig::default();
        config.monitoring.symbols = vec!["DOGE".to_string()];

        cli.apply(&mut config);
        assert_eq!(config.monitoring.symbols, vec!["BONK", "WIF", "PEPE"]);
        assert_eq!(config.monitoring.interval_seconds, 60);
        assert_eq!(config.monitoring.error_policy, ErrorPolicy::Propagate);
    }

    #[test]
    fn test_no_arguments_keep_config() {
        let cli = Cli::try_parse_from(["meme-sentinel"]).unwrap();
        let mut config = MonitorConfig::default();
        config.monitoring.symbols = vec!["DOGE".to_string()];

        cli.apply(&mut config);
        assert_eq!(config.monitoring.symbols, vec!["DOGE"]);
        assert_eq!(config.monitoring.interval_seconds, 300);
    }
}
