use async_trait::async_trait;

use crate::entities::{ContestEntry, ScanEvent, StoredScanEvent};

/// Append-only log of accepted scans. No update, no delete.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Durably appends one event and returns its cursor. Appends are
    /// serialized; readers never observe a partially written event.
    async fn append(&self, event: &ScanEvent) -> anyhow::Result<u64>;

    /// Reads up to `limit` events at or after `cursor`, in append order.
    /// Restartable: pass the last returned cursor + 1 to continue.
    async fn read_since(&self, cursor: u64, limit: usize) -> anyhow::Result<Vec<StoredScanEvent>>;

    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ContestStore: Send + Sync {
    async fn append_entry(&self, entry: &ContestEntry) -> anyhow::Result<()>;
    async fn load_entries(&self) -> anyhow::Result<Vec<ContestEntry>>;
}
