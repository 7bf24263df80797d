//! meme-sentinel - memecoin market and social sentiment monitor
//!
//! Collects market snapshots and social mentions for a set of memecoin
//! symbols, scores sentiment, keeps the results in an in-memory registry and
//! raises buy/sell alerts from sentiment and volume thresholds.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod analysis;

// Re-export main types for convenience
pub use types::{CoinRecord, Signal};
pub use error::{ErrorKind, MonitorError, Result};
pub use config::{ErrorPolicy, MonitorConfig};
