//! In-memory, append-only registry of coin records.

use crate::types::CoinRecord;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared handle to the ordered list of produced records.
///
/// Clones share the same storage. Records are kept in append order with no
/// de-duplication by symbol and are never pruned.
#[derive(Debug, Clone, Default)]
pub struct CoinRegistry {
    records: Arc<RwLock<Vec<CoinRecord>>>,
}

impl CoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, record: CoinRecord) {
        let mut records = self.records.write().await;
        records.push(record);
        debug!("Registry now holds {} records", records.len());
    }

    /// Snapshot of all records in insertion order.
    pub async fn records(&self) -> Vec<CoinRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(symbol: &str) -> CoinRecord {
        CoinRecord::new(symbol, format!("{} Token", symbol), 1.0, 10.0, 10.0, 1, 1, None).unwrap()
    }

    #[tokio::test]
    async fn test_append_keeps_order_and_duplicates() {
        let registry = CoinRegistry::new();
        assert!(registry.is_empty().await);

        registry.append(record("SOL")).await;
        registry.append(record("ETH")).await;
        registry.append(record("SOL")).await;

        let symbols: Vec<String> = registry
            .records()
            .await
            .iter()
            .map(|r| r.symbol().to_string())
            .collect();
        assert_eq!(symbols, vec!["SOL", "ETH", "SOL"]);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let registry = CoinRegistry::new();
        let handle = registry.clone();

        handle.append(record("BONK")).await;
        assert_eq!(registry.len().await, 1);
    }
}
