use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use backend_domain::ports::{ContestStore, EventStore};
use backend_domain::services::Aggregator;
use backend_domain::{AggregateSnapshot, ContestEntry, RuntimeConfig, ScanEvent};
use tokio::sync::{mpsc, Mutex, RwLock};

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub event_store: Arc<dyn EventStore>,
    pub contest_store: Arc<dyn ContestStore>,
    pub aggregator: Arc<Mutex<Aggregator>>,
    /// Latest rollup, refreshed by the aggregation worker. May lag the log
    /// by the queue depth; rebuilt by replay on start.
    pub snapshot: Arc<RwLock<AggregateSnapshot>>,
    pub recent_scans: Arc<RwLock<VecDeque<ScanEvent>>>,
    /// Ids of durably appended events only. An id lands here after its
    /// append succeeds, never before.
    pub seen_event_ids: Arc<RwLock<HashSet<String>>>,
    /// Ids with an append currently in progress. Both sets are only mutated
    /// while holding this mutex, so a submit observes a consistent pair.
    pub inflight_scan_ids: Arc<Mutex<HashSet<String>>>,
    /// contest id -> entrant id -> entry. One mutex makes claim a
    /// check-and-set; duplicate concurrent claims cannot both win.
    pub contest_claims: Arc<Mutex<HashMap<String, HashMap<String, ContestEntry>>>>,
    pub aggregate_tx: mpsc::Sender<ScanEvent>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Builds a fresh state around the given stores. The returned receiver
    /// feeds the aggregation worker; dropping it closes the ingest queue.
    pub fn new(
        config: RuntimeConfig,
        event_store: Arc<dyn EventStore>,
        contest_store: Arc<dyn ContestStore>,
    ) -> (Self, mpsc::Receiver<ScanEvent>) {
        let (aggregate_tx, aggregate_rx) = mpsc::channel(config.aggregate_queue_size);
        let aggregator = Aggregator::new(config.aggregator_config());
        let state = Self {
            config,
            event_store,
            contest_store,
            aggregator: Arc::new(Mutex::new(aggregator)),
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
}
