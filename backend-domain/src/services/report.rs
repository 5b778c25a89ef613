// Report rendering
// Deterministic by construction: the same view and format always produce
// byte-identical output, so exports can be compared in tests and caches.

use thiserror::Error;

use crate::services::tier_policy::{PremiumMetrics, TieredSnapshot};
use crate::value_objects::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Pdf,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// The caller asked for a premium report from a view that was filtered
    /// to basic. Tier policy was skipped somewhere; this is a caller bug,
    /// never an expected runtime condition.
    #[error("premium report requested but the snapshot carries no premium fields")]
    MissingPremiumFields,
}

pub fn render_report(view: &TieredSnapshot, format: ReportFormat) -> Result<Vec<u8>, RenderError> {
    if view.tier == Tier::Premium && view.premium.is_none() {
        return Err(RenderError::MissingPremiumFields);
    }
    match format {
        ReportFormat::Csv => Ok(render_csv(view)),
        ReportFormat::Pdf => Ok(render_pdf(view)),
    }
}

fn render_csv(view: &TieredSnapshot) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, "metric", "label", "value");
    push_row(&mut out, "totalScans", "", &view.total_scans.to_string());
    push_row(&mut out, "uniqueUsers", "", &view.unique_users.to_string());
    push_row(&mut out, "campaignReach", "", &view.campaign_reach.to_string());
    push_row(
        &mut out,
        "engagementRatePct",
        "",
        &fmt2(view.engagement_rate_pct),
    );

    if let Some(premium) = &view.premium {
        push_row(&mut out, "repeatScans", "", &premium.repeat_scans.to_string());
        push_row(
            &mut out,
            "avgSessionMinutes",
            "",
            &fmt2(premium.avg_session_minutes),
        );
        push_row(&mut out, "qrScans", "", &premium.qr_scans.to_string());
        push_row(&mut out, "nfcScans", "", &premium.nfc_scans.to_string());
        for entry in &premium.top_locations {
            push_row(&mut out, "topLocation", &entry.location, &entry.count.to_string());
        }
        for (hour, count) in premium.hourly_histogram.iter().enumerate() {
            push_row(&mut out, "hourlyScans", &format!("{:02}", hour), &count.to_string());
        }
        for share in &premium.demographics.locations {
            push_row(
                &mut out,
                "demographicShare",
                &share.location,
                &fmt2(share.share_pct),
            );
        }
        push_row(
            &mut out,
            "repeatVisitorPct",
            "",
            &fmt2(premium.behavior.repeat_visitor_pct),
        );
        push_row(
            &mut out,
            "scansPerUser",
            "",
            &fmt2(premium.behavior.scans_per_user),
        );
        push_row(&mut out, "costPerScan", "", &fmt2(premium.roi.cost_per_scan));
        push_row(
            &mut out,
            "estimatedValue",
            "",
            &fmt2(premium.roi.estimated_value),
        );
        push_row(&mut out, "roiPct", "", &fmt2(premium.roi.roi_pct));
    }

    out.into_bytes()
}

fn push_row(out: &mut String, metric: &str, label: &str, value: &str) {
    out.push_str(&csv_field(metric));
    out.push(',');
    out.push_str(&csv_field(label));
    out.push(',');
    out.push_str(&csv_field(value));
    out.push_str("\r\n");
}

// RFC 4180: quote fields containing separators or quotes, double the quotes.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn fmt2(value: f64) -> String {
    format!("{:.2}", value)
}

fn render_pdf(view: &TieredSnapshot) -> Vec<u8> {
    let mut lines = Vec::new();
    lines.push("Kardiverse Analytics Report".to_string());
    lines.push(format!("Tier: {}", view.tier.as_str()));
    lines.push(String::new());
    lines.push("Core Metrics".to_string());
    lines.push(format!("  totalScans: {}", view.total_scans));
    lines.push(format!("  uniqueUsers: {}", view.unique_users));
    lines.push(format!("  campaignReach: {}", view.campaign_reach));
    lines.push(format!(
        "  engagementRatePct: {}",
        fmt2(view.engagement_rate_pct)
    ));

    if let Some(premium) = &view.premium {
        push_premium_lines(&mut lines, premium);
    }

    build_pdf(&lines)
}

fn push_premium_lines(lines: &mut Vec<String>, premium: &PremiumMetrics) {
    lines.push(String::new());
    lines.push("Engagement".to_string());
    lines.push(format!("  repeatScans: {}", premium.repeat_scans));
    lines.push(format!(
        "  avgSessionMinutes: {}",
        fmt2(premium.avg_session_minutes)
    ));
    lines.push(format!("  qrScans: {}", premium.qr_scans));
    lines.push(format!("  nfcScans: {}", premium.nfc_scans));

    lines.push(String::new());
    lines.push("Top Locations".to_string());
    for entry in &premium.top_locations {
        lines.push(format!("  {}: {}", entry.location, entry.count));
    }

    lines.push(String::new());
    lines.push("Hourly Histogram".to_string());
    for chunk in premium.hourly_histogram.chunks(6).enumerate() {
        let (index, counts) = chunk;
        let start = index * 6;
        let rendered = counts
            .iter()
            .map(|count| count.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push(format!("  h{:02}-h{:02}: {}", start, start + 5, rendered));
    }

    lines.push(String::new());
    lines.push("Demographics (location share)".to_string());
    for share in &premium.demographics.locations {
        lines.push(format!("  {}: {}%", share.location, fmt2(share.share_pct)));
    }

    lines.push(String::new());
    lines.push("Behavior".to_string());
    lines.push(format!(
        "  repeatVisitorPct: {}",
        fmt2(premium.behavior.repeat_visitor_pct)
    ));
    lines.push(format!(
        "  scansPerUser: {}",
        fmt2(premium.behavior.scans_per_user)
    ));

    lines.push(String::new());
    lines.push("ROI".to_string());
    lines.push(format!("  costPerScan: {}", fmt2(premium.roi.cost_per_scan)));
    lines.push(format!(
        "  estimatedValue: {}",
        fmt2(premium.roi.estimated_value)
    ));
    lines.push(format!("  roiPct: {}", fmt2(premium.roi.roi_pct)));
}

// Fixed-layout single-page PDF, assembled object by object. Offsets in the
// xref table are computed from the actual byte positions, so output is valid
// and reproducible without a PDF library (none is used anywhere else either).
fn build_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = String::from("BT\n/F1 10 Tf\n12 TL\n72 770 Td\n");
    for line in lines {
        content.push_str(&format!("({}) Tj\nT*\n", pdf_escape(line)));
    }
    content.push_str("ET\n");

    let objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", index + 1, body).as_bytes());
    }

    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

// Helvetica is a latin font; anything outside printable ASCII is replaced so
// the text operators stay well-formed.
fn pdf_escape(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    for ch in line.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            ' '..='~' => escaped.push(ch),
            _ => escaped.push('?'),
        }
    }
    escaped
}
