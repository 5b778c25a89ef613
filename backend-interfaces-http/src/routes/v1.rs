use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    analytics_handlers, contest_handlers, ops_handlers, report_handlers, scan_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/scans", axum::routing::post(scan_handlers::submit_scan))
        .route(
            "/v1/scans/recent",
            axum::routing::get(scan_handlers::recent_scans),
        )
        .route(
            "/v1/analytics",
            axum::routing::get(analytics_handlers::get_analytics),
        )
        .route(
            "/v1/reports",
            axum::routing::get(report_handlers::export_report),
        )
        .route(
            "/v1/contests/:contest_id/claim",
            axum::routing::post(contest_handlers::claim_entry),
        )
        .route(
            "/v1/contests/:contest_id",
            axum::routing::get(contest_handlers::contest_status),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
