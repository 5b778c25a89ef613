use uuid::Uuid;

use backend_domain::utils::current_millis;
use backend_domain::{ClaimRequest, ContestEntry};

use crate::{AppError, AppState};

/// Claims a contest entry: at most one per entrant per contest. The whole
/// check-and-set runs under the claims mutex, so concurrent duplicate claims
/// from the same entrant cannot both win.
pub async fn claim_entry(
    state: &AppState,
    contest_id: &str,
    request: ClaimRequest,
) -> Result<ContestEntry, AppError> {
    let contest_id = contest_id.trim();
    if contest_id.is_empty() {
        return Err(AppError::Validation("contest id must not be empty".to_string()));
    }
    let entrant_id = request.entrant_id.trim().to_string();
    if entrant_id.is_empty() {
        return Err(AppError::Validation("entrantId must not be empty".to_string()));
    }
    let scan_event_id = request
        .scan_event_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string);
    if let Some(scan_id) = &scan_event_id {
        if !state.seen_event_ids.read().await.contains(scan_id) {
            return Err(AppError::Validation(format!(
                "scanEventId '{}' does not reference an accepted scan",
                scan_id
            )));
        }
    }

    let mut claims = state.contest_claims.lock().await;
    let contest = claims.entry(contest_id.to_string()).or_default();
    if contest.contains_key(&entrant_id) {
        state.metrics.record_rejected_claim();
        return Err(AppError::AlreadyClaimed(entrant_id));
    }

    let entry = ContestEntry {
        entry_id: Uuid::new_v4(),
        contest_id: contest_id.to_string(),
        entrant_id: entrant_id.clone(),
        claimed_at: current_millis(),
        scan_event_id,
    };
    // Persist before exposing the claim; on failure nothing changed.
    state
        .contest_store
        .append_entry(&entry)
        .await
        .map_err(AppError::Storage)?;
    contest.insert(entrant_id, entry.clone());

    state.metrics.record_claim();
    Ok(entry)
}
