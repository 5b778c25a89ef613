use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use backend_application::AppState;
use backend_domain::ScanEvent;

const REPLAY_BATCH: usize = 500;
const RECENT_SCANS_CAP: usize = 50;

/// Drains the ingest queue and folds each scan into the aggregator, then
/// publishes a fresh snapshot. Ingest never waits on this; a scan is acked
/// once the log append succeeds.
pub async fn run_aggregation(state: AppState, mut rx: mpsc::Receiver<ScanEvent>) {
    info!("aggregation worker started");
    while let Some(event) = rx.recv().await {
        apply_event(&state, event).await;
    }
    info!("aggregation worker stopped");
}

async fn apply_event(state: &AppState, event: ScanEvent) {
    let snapshot = {
        let mut aggregator = state.aggregator.lock().await;
        aggregator.apply(&event);
        aggregator.snapshot()
    };
    *state.snapshot.write().await = snapshot;

    let mut recent = state.recent_scans.write().await;
    recent.push_front(event);
    recent.truncate(RECENT_SCANS_CAP);
}

/// Rebuilds all in-memory state from the event log. Called once at startup
/// before the HTTP surface is up, so reads never see a partial rollup.
pub async fn replay_event_log(state: &AppState) -> Result<u64> {
    let mut cursor = 0u64;
    let mut replayed = 0u64;

    let mut aggregator = state.aggregator.lock().await;
    let mut seen = state.seen_event_ids.write().await;
    let mut recent = state.recent_scans.write().await;

    loop {
        let batch = state.event_store.read_since(cursor, REPLAY_BATCH).await?;
        if batch.is_empty() {
            break;
        }
        for stored in batch {
            cursor = stored.cursor + 1;
            replayed += 1;
            seen.insert(stored.event.id.clone());
            aggregator.apply(&stored.event);
            recent.push_front(stored.event);
            recent.truncate(RECENT_SCANS_CAP);
        }
    }

    let snapshot = aggregator.snapshot();
    debug!(
        "replay complete: {} events, {} unique users",
        replayed, snapshot.unique_users
    );
    drop(recent);
    drop(seen);
    drop(aggregator);

    *state.snapshot.write().await = snapshot;
    info!("replayed {} scan events from the log", replayed);
    Ok(replayed)
}

/// Rebuilds the contest claim index from the contest log.
pub async fn replay_contest_log(state: &AppState) -> Result<u64> {
    let entries = state.contest_store.load_entries().await?;
    let replayed = entries.len() as u64;

    let mut claims = state.contest_claims.lock().await;
    for entry in entries {
        claims
            .entry(entry.contest_id.clone())
            .or_default()
            .insert(entry.entrant_id.clone(), entry);
    }
    info!("replayed {} contest entries from the log", replayed);
    Ok(replayed)
}
