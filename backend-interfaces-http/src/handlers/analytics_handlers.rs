use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::queries::analytics_queries;
use backend_application::AppState;
use backend_domain::{Tier, TieredSnapshot};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Deserialize)]
pub struct AnalyticsQuery {
    pub tier: Option<String>,
}

/// Returns the current rollup filtered to the caller's tier. Absent or
/// unrecognized tiers resolve to basic, never to premium.
pub async fn get_analytics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<TieredSnapshot>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let tier = query
        .tier
        .as_deref()
        .and_then(Tier::parse)
        .unwrap_or(Tier::Basic);
    let view = analytics_queries::get_analytics(&state, tier).await;
    Ok(Json(view))
}
