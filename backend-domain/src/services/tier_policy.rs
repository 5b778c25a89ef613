// Tier policy
// Single enforcement point on the read path: ingestion and aggregation never
// look at the tier, so a forged tier flag upstream cannot widen access.

use serde::{Deserialize, Serialize};

use crate::entities::{AggregateSnapshot, LocationCount};
use crate::value_objects::Tier;

#[derive(Debug, Clone)]
pub struct TierPolicyConfig {
    /// Estimated impressions per unique user.
    pub reach_multiplier: u64,
    pub cost_per_scan: f64,
    pub value_per_scan: f64,
}

impl Default for TierPolicyConfig {
    fn default() -> Self {
        Self {
            reach_multiplier: 10,
            cost_per_scan: 0.12,
            value_per_scan: 1.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredSnapshot {
    pub tier: Tier,
    pub total_scans: u64,
    pub unique_users: u64,
    pub campaign_reach: u64,
    pub engagement_rate_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium: Option<PremiumMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumMetrics {
    pub repeat_scans: u64,
    pub avg_session_minutes: f64,
    pub qr_scans: u64,
    pub nfc_scans: u64,
    pub top_locations: Vec<LocationCount>,
    pub hourly_histogram: [u64; 24],
    pub demographics: Demographics,
    pub behavior: BehaviorMetrics,
    pub roi: RoiMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub locations: Vec<LocationShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationShare {
    pub location: String,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorMetrics {
    pub repeat_visitor_pct: f64,
    pub avg_session_minutes: f64,
    pub scans_per_user: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiMetrics {
    pub cost_per_scan: f64,
    pub estimated_value: f64,
    pub roi_pct: f64,
}

/// Pure view filter; the source snapshot is never mutated.
pub fn filter(snapshot: &AggregateSnapshot, tier: Tier, config: &TierPolicyConfig) -> TieredSnapshot {
    let campaign_reach = snapshot.unique_users * config.reach_multiplier;
    let engagement_rate_pct = pct(snapshot.repeat_scans, snapshot.total_scans);

    let premium = match tier {
        Tier::Basic => None,
        Tier::Premium => Some(premium_metrics(snapshot, config)),
    };

    TieredSnapshot {
        tier,
        total_scans: snapshot.total_scans,
        unique_users: snapshot.unique_users,
        campaign_reach,
        engagement_rate_pct,
        premium,
    }
}

fn premium_metrics(snapshot: &AggregateSnapshot, config: &TierPolicyConfig) -> PremiumMetrics {
    let cost = snapshot.total_scans as f64 * config.cost_per_scan;
    let estimated_value = round2(snapshot.total_scans as f64 * config.value_per_scan);
    let roi_pct = if cost > 0.0 {
        round2(100.0 * (estimated_value - cost) / cost)
    } else {
        0.0
    };

    let locations = snapshot
        .top_locations
        .iter()
        .map(|entry| LocationShare {
            location: entry.location.clone(),
            share_pct: pct(entry.count, snapshot.total_scans),
        })
        .collect();

    let scans_per_user = if snapshot.unique_users > 0 {
        round2(snapshot.total_scans as f64 / snapshot.unique_users as f64)
    } else {
        0.0
    };
    PremiumMetrics {
        repeat_scans: snapshot.repeat_scans,
        avg_session_minutes: round2(snapshot.avg_session_minutes),
        qr_scans: snapshot.qr_scans,
        nfc_scans: snapshot.nfc_scans,
        top_locations: snapshot.top_locations.clone(),
        hourly_histogram: snapshot.hourly_histogram,
        demographics: Demographics { locations },
        behavior: BehaviorMetrics {
            repeat_visitor_pct: pct(snapshot.repeat_scans, snapshot.total_scans),
            avg_session_minutes: round2(snapshot.avg_session_minutes),
            scans_per_user,
        },
        roi: RoiMetrics {
            cost_per_scan: config.cost_per_scan,
            estimated_value,
            roi_pct,
        },
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(100.0 * part as f64 / whole as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::LocationCount;

    fn snapshot() -> AggregateSnapshot {
        AggregateSnapshot {
            version: 7,
            total_scans: 100,
            unique_users: 40,
            repeat_scans: 60,
            avg_session_minutes: 2.4,
            qr_scans: 70,
            nfc_scans: 30,
            top_locations: vec![
                LocationCount {
                    location: "Nairobi, Kenya".to_string(),
                    count: 55,
                },
                LocationCount {
                    location: "Lagos, Nigeria".to_string(),
                    count: 45,
                },
            ],
            hourly_histogram: [0; 24],
        }
    }

    #[test]
    fn basic_view_exposes_only_basic_fields() {
        let view = filter(&snapshot(), Tier::Basic, &TierPolicyConfig::default());
        assert!(view.premium.is_none());

        let json = serde_json::to_string(&view).expect("serialize view");
        assert!(!json.contains("demographics"));
        assert!(!json.contains("roi"));
        assert!(!json.contains("behavior"));
        assert!(!json.contains("repeatScans"));
        assert!(json.contains("totalScans"));
        assert!(json.contains("uniqueUsers"));
        assert!(json.contains("campaignReach"));
        assert!(json.contains("engagementRatePct"));
    }

    #[test]
    fn premium_view_includes_derived_groups() {
        let config = TierPolicyConfig::default();
        let view = filter(&snapshot(), Tier::Premium, &config);
        let premium = view.premium.expect("premium metrics");

        assert_eq!(view.campaign_reach, 400);
        assert_eq!(premium.repeat_scans, 60);
        assert_eq!(premium.demographics.locations.len(), 2);
        assert!((premium.demographics.locations[0].share_pct - 55.0).abs() < 1e-9);
        assert!((premium.roi.estimated_value - 120.0).abs() < 1e-9);
        // cost 12.0, value 120.0 -> 900% return
        assert!((premium.roi.roi_pct - 900.0).abs() < 1e-9);
        assert!((premium.behavior.scans_per_user - 2.5).abs() < 1e-9);
    }

    #[test]
    fn filter_does_not_mutate_source() {
        let source = snapshot();
        let before = source.clone();
        let _ = filter(&source, Tier::Premium, &TierPolicyConfig::default());
        assert_eq!(source, before);
    }

    #[test]
    fn empty_snapshot_filters_cleanly() {
        let view = filter(
            &AggregateSnapshot::default(),
            Tier::Premium,
            &TierPolicyConfig::default(),
        );
        assert_eq!(view.total_scans, 0);
        assert_eq!(view.engagement_rate_pct, 0.0);
        let premium = view.premium.expect("premium metrics");
        assert_eq!(premium.roi.roi_pct, 0.0);
        assert_eq!(premium.behavior.scans_per_user, 0.0);
    }
}
