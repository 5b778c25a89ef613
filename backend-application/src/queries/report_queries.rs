use tracing::error;

use backend_domain::services::report;
use backend_domain::{ReportFormat, Tier};

use crate::queries::analytics_queries;
use crate::{AppError, AppState};

pub async fn export_report(
    state: &AppState,
    tier: Tier,
    format: ReportFormat,
) -> Result<Vec<u8>, AppError> {
    let view = analytics_queries::get_analytics(state, tier).await;
    let bytes = report::render_report(&view, format).map_err(|err| {
        // Can only happen if a caller bypasses the tier filter above.
        error!("report render contract violation: {}", err);
        AppError::Render(err)
    })?;
    state.metrics.record_report();
    Ok(bytes)
}
