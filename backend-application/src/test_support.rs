// In-memory test doubles for the storage ports

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, RwLock, Semaphore};

use backend_domain::ports::{ContestStore, EventStore};
use backend_domain::services::Aggregator;
use backend_domain::utils::current_millis;
use backend_domain::{
    AggregateSnapshot, ContestEntry, RuntimeConfig, ScanEvent, ScanEventInput, ScanType,
    StoredScanEvent,
};

use crate::{AppState, Metrics};

#[derive(Default)]
pub(crate) struct MemoryEventStore {
    events: Mutex<Vec<ScanEvent>>,
}

impl MemoryEventStore {
    pub(crate) async fn len(&self) -> usize {
        self.events.lock().await.len()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &ScanEvent) -> anyhow::Result<u64> {
        let mut events = self.events.lock().await;
        events.push(event.clone());
        Ok(events.len() as u64 - 1)
    }

    async fn read_since(&self, cursor: u64, limit: usize) -> anyhow::Result<Vec<StoredScanEvent>> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .enumerate()
            .skip(cursor as usize)
            .take(limit)
            .map(|(index, event)| StoredScanEvent {
                cursor: index as u64,
                event: event.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Fails every append, or just the first `n` when built with
/// `failing_times(n)`.
#[derive(Default)]
pub(crate) struct FailingEventStore {
    fail_first: Option<u64>,
    attempts: AtomicU64,
    inner: MemoryEventStore,
}

impl FailingEventStore {
    pub(crate) fn failing_times(n: u64) -> Self {
        Self {
            fail_first: Some(n),
            attempts: AtomicU64::new(0),
            inner: MemoryEventStore::default(),
        }
    }

    pub(crate) fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventStore for FailingEventStore {
    async fn append(&self, event: &ScanEvent) -> anyhow::Result<u64> {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
        match self.fail_first {
            Some(n) if attempt >= n => self.inner.append(event).await,
            _ => Err(anyhow!("disk unavailable")),
        }
    }

    async fn read_since(&self, cursor: u64, limit: usize) -> anyhow::Result<Vec<StoredScanEvent>> {
        self.inner.read_since(cursor, limit).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Err(anyhow!("disk unavailable"))
    }
}

/// Fails every append; the first one additionally blocks inside the call
/// until `release()` is invoked, so a test can hold a submit mid-append
/// while issuing concurrent requests.
pub(crate) struct StallingEventStore {
    entered: Semaphore,
    release: Semaphore,
    attempts: AtomicU64,
}

impl Default for StallingEventStore {
    fn default() -> Self {
        Self {
            entered: Semaphore::new(0),
            release: Semaphore::new(0),
            attempts: AtomicU64::new(0),
        }
    }
}

impl StallingEventStore {
    /// Resolves once the first append is inside the store.
    pub(crate) async fn entered(&self) {
        self.entered
            .acquire()
            .await
            .expect("stalling store entered signal")
            .forget();
    }

    /// Lets the blocked first append proceed to its failure.
    pub(crate) fn release(&self) {
        self.release.add_permits(1);
    }
}

#[async_trait]
impl EventStore for StallingEventStore {
    async fn append(&self, _event: &ScanEvent) -> anyhow::Result<u64> {
        if self.attempts.fetch_add(1, Ordering::Relaxed) == 0 {
            self.entered.add_permits(1);
            self.release
                .acquire()
                .await
                .map_err(|_| anyhow!("stalling store closed"))?
                .forget();
        }
        Err(anyhow!("disk unavailable"))
    }

    async fn read_since(&self, _cursor: u64, _limit: usize) -> anyhow::Result<Vec<StoredScanEvent>> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Err(anyhow!("disk unavailable"))
    }
}

#[derive(Default)]
pub(crate) struct MemoryContestStore {
    entries: Mutex<Vec<ContestEntry>>,
}

#[async_trait]
impl ContestStore for MemoryContestStore {
    async fn append_entry(&self, entry: &ContestEntry) -> anyhow::Result<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn load_entries(&self) -> anyhow::Result<Vec<ContestEntry>> {
        Ok(self.entries.lock().await.clone())
    }
}

pub(crate) fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        data_dir: "./data".to_string(),
        report_dir: "./reports".to_string(),
        top_locations_limit: 10,
        histogram_utc_offset_hours: 0,
        clock_skew_seconds: 300,
        reach_multiplier: 10,
        cost_per_scan: 0.12,
        value_per_scan: 1.20,
        storage_retry_max: 2,
        storage_retry_base_ms: 1,
        aggregate_queue_size: 16,
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 5,
        report_hour: 0,
        report_minute: 5,
    }
}

pub(crate) fn test_state(
    event_store: Arc<dyn EventStore>,
) -> (AppState, mpsc::Receiver<ScanEvent>) {
    let config = test_config();
    let (aggregate_tx, aggregate_rx) = mpsc::channel(config.aggregate_queue_size);
    let state = AppState {
        aggregator: Arc::new(Mutex::new(Aggregator::new(config.aggregator_config()))),
        config,
        event_store,
        contest_store: Arc::new(MemoryContestStore::default()),
        snapshot: Arc::new(RwLock::new(AggregateSnapshot::default())),
        recent_scans: Arc::new(RwLock::new(VecDeque::new())),
        seen_event_ids: Arc::new(RwLock::new(HashSet::new())),
        inflight_scan_ids: Arc::new(Mutex::new(HashSet::new())),
        contest_claims: Arc::new(Mutex::new(HashMap::new())),
        aggregate_tx,
        metrics: Arc::new(Metrics::default()),
    };
    (state, aggregate_rx)
}

pub(crate) fn qr_input(id: &str) -> ScanEventInput {
    ScanEventInput {
        id: id.to_string(),
        scan_type: ScanType::Qr,
        timestamp: current_millis() - 1_000,
        location: "Nairobi, Kenya".to_string(),
        device_fingerprint: "fp-test".to_string(),
        user_id: Some("user-test".to_string()),
    }
}
