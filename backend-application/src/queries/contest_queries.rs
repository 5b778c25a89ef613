use backend_domain::ContestStatus;

use crate::AppState;

pub async fn contest_status(
    state: &AppState,
    contest_id: &str,
    entrant_id: Option<&str>,
) -> ContestStatus {
    let contest_id = contest_id.trim();
    let claims = state.contest_claims.lock().await;
    let contest = claims.get(contest_id);
    let entries = contest.map(|entries| entries.len() as u64).unwrap_or(0);
    let claimed = entrant_id.map(|entrant| {
        contest
            .map(|entries| entries.contains_key(entrant.trim()))
            .unwrap_or(false)
    });
    ContestStatus {
        contest_id: contest_id.to_string(),
        entries,
        claimed,
    }
}
