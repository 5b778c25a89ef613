use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::contest_commands;
use backend_application::queries::contest_queries;
use backend_application::AppState;
use backend_domain::{ClaimRequest, ContestEntry, ContestStatus};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestStatusQuery {
    pub entrant_id: Option<String>,
}

pub async fn claim_entry(
    State(state): State<AppState>,
    Path(contest_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ClaimRequest>,
) -> Result<Json<ContestEntry>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let entry = contest_commands::claim_entry(&state, &contest_id, payload).await?;
    Ok(Json(entry))
}

pub async fn contest_status(
    State(state): State<AppState>,
    Path(contest_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ContestStatusQuery>,
) -> Result<Json<ContestStatus>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let status =
        contest_queries::contest_status(&state, &contest_id, query.entrant_id.as_deref()).await;
    Ok(Json(status))
}
