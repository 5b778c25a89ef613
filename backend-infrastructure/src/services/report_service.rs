use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use tokio::fs;
use tracing::{error, info};

use backend_application::AppState;
use backend_domain::services::{render_report, tier_policy, ReportFormat};
use backend_domain::{RuntimeConfig, Tier};

/// Writes a premium CSV and PDF snapshot of the rollups to the report dir
/// once per day at the configured local time.
pub async fn schedule_reports(state: AppState) {
    loop {
        let next = next_report_time(&state.config);
        let duration = next.signed_duration_since(Local::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        match generate_daily_reports(&state).await {
            Ok(paths) => info!("daily reports written: {:?}", paths),
            Err(err) => error!("report generation failed: {}", err),
        }
    }
}

pub async fn generate_daily_reports(state: &AppState) -> Result<Vec<PathBuf>> {
    let snapshot = state.snapshot.read().await.clone();
    let view = tier_policy::filter(&snapshot, Tier::Premium, &state.config.tier_policy_config());

    let report_dir = Path::new(&state.config.report_dir);
    fs::create_dir_all(report_dir).await?;

    let date = Local::now().format("%Y-%m-%d").to_string();
    let mut written = Vec::new();
    for format in [ReportFormat::Csv, ReportFormat::Pdf] {
        let bytes = render_report(&view, format)?;
        let path = report_dir.join(format!("{}.{}", date, format.extension()));
        fs::write(&path, bytes).await?;
        state.metrics.record_report();
        written.push(path);
    }
    Ok(written)
}

fn next_report_time(config: &RuntimeConfig) -> DateTime<Local> {
    let now = Local::now();
    let mut date = now.date_naive();
    // The configured wall-clock time may not exist on a given day (DST gap)
    // or may be ambiguous (DST overlap); take the earliest mapping and skip
    // to the next day when the time does not exist at all.
    for _ in 0..3 {
        if let Some(target) = date.and_hms_opt(config.report_hour, config.report_minute, 0) {
            if let Some(dt) = Local.from_local_datetime(&target).earliest() {
                if dt > now {
                    return dt;
                }
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    now + chrono::Duration::days(1)
}
