use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    scans_ingested: AtomicU64,
    duplicate_scans: AtomicU64,
    ingest_errors: AtomicU64,
    contest_claims: AtomicU64,
    rejected_claims: AtomicU64,
    reports_rendered: AtomicU64,
}

impl Metrics {
    pub fn record_scan(&self) {
        self.scans_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicate_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ingest_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_claim(&self) {
        self.contest_claims.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_claim(&self) {
        self.rejected_claims.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_report(&self) {
        self.reports_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let scans = self.scans_ingested.load(Ordering::Relaxed);
        let duplicates = self.duplicate_scans.load(Ordering::Relaxed);
        let errors = self.ingest_errors.load(Ordering::Relaxed);
        let claims = self.contest_claims.load(Ordering::Relaxed);
        let rejected = self.rejected_claims.load(Ordering::Relaxed);
        let reports = self.reports_rendered.load(Ordering::Relaxed);

        format!(
            "# TYPE kardiverse_scans_ingested_total counter\n\
kardiverse_scans_ingested_total {}\n\
# TYPE kardiverse_duplicate_scans_total counter\n\
kardiverse_duplicate_scans_total {}\n\
# TYPE kardiverse_ingest_errors_total counter\n\
kardiverse_ingest_errors_total {}\n\
# TYPE kardiverse_contest_claims_total counter\n\
kardiverse_contest_claims_total {}\n\
# TYPE kardiverse_rejected_claims_total counter\n\
kardiverse_rejected_claims_total {}\n\
# TYPE kardiverse_reports_rendered_total counter\n\
kardiverse_reports_rendered_total {}\n",
            scans, duplicates, errors, claims, rejected, reports
        )
    }
}
