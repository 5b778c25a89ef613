use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::warn;

use backend_application::commands::scan_commands;
use backend_application::queries::scan_queries;
use backend_application::AppState;
use backend_domain::ScanEvent;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_scan};

#[derive(serde::Deserialize)]
pub struct RecentScansQuery {
    pub limit: Option<usize>,
}

pub async fn submit_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<ScanEvent>), HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let input = parse_scan(&headers, &body, state.config.max_body_bytes).map_err(|err| {
        warn!("failed to parse scan body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;

    let event = scan_commands::submit_scan(&state, input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn recent_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<RecentScansQuery>,
) -> Result<Json<Vec<ScanEvent>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let scans = scan_queries::recent_scans(&state, query.limit).await;
    Ok(Json(scans))
}
