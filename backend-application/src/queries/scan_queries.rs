use backend_domain::ScanEvent;

use crate::AppState;

pub async fn recent_scans(state: &AppState, limit: Option<usize>) -> Vec<ScanEvent> {
    let limit = limit.unwrap_or(10).clamp(1, 50);
    let recent = state.recent_scans.read().await;
    recent.iter().take(limit).cloned().collect()
}
