use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use backend_application::AppState;
use backend_domain::ScanEvent;
use backend_infrastructure::{
    replay_contest_log, replay_event_log, AppConfig, FileContestStore, FileEventStore,
};

pub struct AppContext {
    pub state: AppState,
    /// Handed to the aggregation worker by the lifecycle.
    pub aggregate_rx: mpsc::Receiver<ScanEvent>,
}

impl AppContext {
    /// Loads config, opens the logs and rebuilds every rollup before the
    /// HTTP surface comes up.
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();

        let event_store = Arc::new(FileEventStore::open(&runtime_config.data_dir).await?);
        let contest_store = Arc::new(FileContestStore::open(&runtime_config.data_dir).await?);

        let (state, aggregate_rx) = AppState::new(runtime_config, event_store, contest_store);
        replay_event_log(&state).await?;
        replay_contest_log(&state).await?;

        Ok(Self {
            state,
            aggregate_rx,
        })
    }
}
