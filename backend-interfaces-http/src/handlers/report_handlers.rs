use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;

use backend_application::queries::report_queries;
use backend_application::AppState;
use backend_domain::{ReportFormat, Tier};

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Deserialize)]
pub struct ReportQuery {
    pub tier: Option<String>,
    pub format: Option<String>,
}

pub async fn export_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let tier = query
        .tier
        .as_deref()
        .and_then(Tier::parse)
        .unwrap_or(Tier::Basic);
    let format = match query.format.as_deref() {
        None => ReportFormat::Csv,
        Some(value) => ReportFormat::parse(value)
            .ok_or_else(|| HttpError::BadRequest(format!("unknown report format '{}'", value)))?,
    };

    let bytes = report_queries::export_report(&state, tier, format).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    let disposition = format!(
        "attachment; filename=\"kardiverse-{}.{}\"",
        tier.as_str(),
        format.extension()
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok((response_headers, bytes))
}
