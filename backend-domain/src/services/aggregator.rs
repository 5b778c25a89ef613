use std::collections::HashMap;

use crate::entities::{AggregateSnapshot, LocationCount, ScanEvent};
use crate::value_objects::{ScanType, UserKey};

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub top_locations_limit: usize,
    /// Fixed offset applied before bucketing timestamps by hour of day.
    pub utc_offset_hours: i32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            top_locations_limit: 10,
            utc_offset_hours: 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct UserActivity {
    scans: u64,
    first_ms: i64,
    last_ms: i64,
}

#[derive(Debug, Default, Clone, Copy)]
struct LocationStat {
    count: u64,
    last_seen_ms: i64,
}

/// Incrementally maintains rollups over the scan event log.
///
/// Every counter is commutative over the event set: replaying the same
/// events in any arrival order produces an identical snapshot. Orderings
/// derived from time (top-location tie breaks, session spans) use the event
/// timestamp, never the arrival order.
#[derive(Debug)]
pub struct Aggregator {
    config: AggregatorConfig,
    version: u64,
    total_scans: u64,
    qr_scans: u64,
    nfc_scans: u64,
    users: HashMap<UserKey, UserActivity>,
    locations: HashMap<String, LocationStat>,
    hourly: [u64; 24],
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            config,
            version: 0,
            total_scans: 0,
            qr_scans: 0,
            nfc_scans: 0,
            users: HashMap::new(),
            locations: HashMap::new(),
            hourly: [0; 24],
        }
    }

    pub fn apply(&mut self, event: &ScanEvent) -> AggregateSnapshot {
        self.version += 1;
        self.total_scans += 1;
        match event.scan_type {
            ScanType::Qr => self.qr_scans += 1,
            ScanType::Nfc => self.nfc_scans += 1,
        }

        let bucket = hour_bucket(event.timestamp, self.config.utc_offset_hours);
        self.hourly[bucket] += 1;

        let key = event.user_key();
        let activity = self.users.entry(key).or_insert(UserActivity {
            scans: 0,
            first_ms: event.timestamp,
            last_ms: event.timestamp,
        });
        activity.scans += 1;
        activity.first_ms = activity.first_ms.min(event.timestamp);
        activity.last_ms = activity.last_ms.max(event.timestamp);

        let location = event.location.trim().to_string();
        let stat = self.locations.entry(location).or_default();
        stat.count += 1;
        stat.last_seen_ms = stat.last_seen_ms.max(event.timestamp);

        self.snapshot()
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        let unique_users = self.users.len() as u64;
        let repeat_scans = self.total_scans.saturating_sub(unique_users);

        // Integer sums keep the result independent of HashMap iteration order.
        let mut session_sum_ms: u128 = 0;
        let mut repeat_users: u64 = 0;
        for activity in self.users.values() {
            if activity.scans >= 2 {
                repeat_users += 1;
                let span = (activity.last_ms - activity.first_ms).max(0) as u128;
                session_sum_ms += span / (activity.scans as u128 - 1);
            }
        }
        let avg_session_minutes = if repeat_users > 0 {
            (session_sum_ms / repeat_users as u128) as f64 / 60_000.0
        } else {
            0.0
        };

        let mut top_locations: Vec<(String, LocationStat)> = self
            .locations
            .iter()
            .map(|(location, stat)| (location.clone(), *stat))
            .collect();
        top_locations.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(b.1.last_seen_ms.cmp(&a.1.last_seen_ms))
                .then(a.0.cmp(&b.0))
        });
        top_locations.truncate(self.config.top_locations_limit);

        AggregateSnapshot {
            version: self.version,
            total_scans: self.total_scans,
            unique_users,
            repeat_scans,
            avg_session_minutes,
            qr_scans: self.qr_scans,
            nfc_scans: self.nfc_scans,
            top_locations: top_locations
                .into_iter()
                .map(|(location, stat)| LocationCount {
                    location,
                    count: stat.count,
                })
                .collect(),
            hourly_histogram: self.hourly,
        }
    }
}

fn hour_bucket(timestamp_ms: i64, utc_offset_hours: i32) -> usize {
    let hours = timestamp_ms.div_euclid(3_600_000) + utc_offset_hours as i64;
    hours.rem_euclid(24) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::ScanType;

    fn scan(id: &str, scan_type: ScanType, timestamp: i64, location: &str, user: &str) -> ScanEvent {
        ScanEvent {
            id: id.to_string(),
            scan_type,
            timestamp,
            location: location.to_string(),
            device_fingerprint: format!("fp-{}", user),
            user_id: Some(user.to_string()),
        }
    }

    #[test]
    fn counts_match_three_scans_from_two_users() {
        let mut aggregator = Aggregator::new(AggregatorConfig::default());
        aggregator.apply(&scan("a", ScanType::Qr, 1_000, "Nairobi, Kenya", "alice"));
        aggregator.apply(&scan("b", ScanType::Qr, 61_000, "Nairobi, Kenya", "alice"));
        let snapshot = aggregator.apply(&scan("c", ScanType::Nfc, 120_000, "Lagos, Nigeria", "bob"));

        assert_eq!(snapshot.total_scans, 3);
        assert_eq!(snapshot.unique_users, 2);
        assert_eq!(snapshot.repeat_scans, 1);
        assert_eq!(snapshot.qr_scans, 2);
        assert_eq!(snapshot.nfc_scans, 1);
        assert_eq!(snapshot.version, 3);
    }

    #[test]
    fn histogram_sums_to_total() {
        let mut aggregator = Aggregator::new(AggregatorConfig::default());
        for i in 0..50 {
            aggregator.apply(&scan(
                &format!("e{}", i),
                ScanType::Qr,
                i * 37 * 60_000,
                "Kampala, Uganda",
                &format!("user{}", i % 7),
            ));
        }
        let snapshot = aggregator.snapshot();
        let bucketed: u64 = snapshot.hourly_histogram.iter().sum();
        assert_eq!(bucketed, snapshot.total_scans);
    }

    #[test]
    fn histogram_respects_utc_offset() {
        let config = AggregatorConfig {
            utc_offset_hours: 3,
            ..AggregatorConfig::default()
        };
        let mut aggregator = Aggregator::new(config);
        // 00:30 UTC lands in the 03 bucket at UTC+3.
        let snapshot = aggregator.apply(&scan("a", ScanType::Qr, 30 * 60_000, "Nairobi, Kenya", "u"));
        assert_eq!(snapshot.hourly_histogram[3], 1);
    }

    #[test]
    fn replay_order_does_not_change_snapshot() {
        let events = vec![
            scan("a", ScanType::Qr, 5_000, "Nairobi, Kenya", "alice"),
            scan("b", ScanType::Nfc, 1_000, "Lagos, Nigeria", "bob"),
            scan("c", ScanType::Qr, 9_000, "Nairobi, Kenya", "alice"),
            scan("d", ScanType::Qr, 3_000, "Kigali, Rwanda", "carol"),
            scan("e", ScanType::Nfc, 7_000, "Lagos, Nigeria", "bob"),
        ];

        let mut forward = Aggregator::new(AggregatorConfig::default());
        for event in &events {
            forward.apply(event);
        }
        let mut reversed = Aggregator::new(AggregatorConfig::default());
        for event in events.iter().rev() {
            reversed.apply(event);
        }

        assert_eq!(forward.snapshot(), reversed.snapshot());
    }

    #[test]
    fn top_locations_ordered_by_count_then_recency() {
        let mut aggregator = Aggregator::new(AggregatorConfig {
            top_locations_limit: 2,
            ..AggregatorConfig::default()
        });
        aggregator.apply(&scan("a", ScanType::Qr, 1_000, "Lagos, Nigeria", "u1"));
        aggregator.apply(&scan("b", ScanType::Qr, 2_000, "Lagos, Nigeria", "u2"));
        aggregator.apply(&scan("c", ScanType::Qr, 9_000, "Nairobi, Kenya", "u3"));
        aggregator.apply(&scan("d", ScanType::Qr, 4_000, "Kampala, Uganda", "u4"));

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.top_locations.len(), 2);
        assert_eq!(snapshot.top_locations[0].location, "Lagos, Nigeria");
        assert_eq!(snapshot.top_locations[0].count, 2);
        // Nairobi and Kampala tie at one scan; Nairobi is more recent.
        assert_eq!(snapshot.top_locations[1].location, "Nairobi, Kenya");
    }

    #[test]
    fn session_time_derives_from_event_timestamps() {
        let mut aggregator = Aggregator::new(AggregatorConfig::default());
        aggregator.apply(&scan("a", ScanType::Qr, 0, "Nairobi, Kenya", "alice"));
        aggregator.apply(&scan("b", ScanType::Qr, 6 * 60_000, "Nairobi, Kenya", "alice"));
        aggregator.apply(&scan("c", ScanType::Qr, 12 * 60_000, "Nairobi, Kenya", "alice"));
        let snapshot = aggregator.snapshot();
        // 12 minutes over 2 gaps.
        assert!((snapshot.avg_session_minutes - 6.0).abs() < 1e-9);
    }

    #[test]
    fn anonymous_scans_fall_back_to_device_fingerprint() {
        let mut aggregator = Aggregator::new(AggregatorConfig::default());
        let mut event = scan("a", ScanType::Qr, 1_000, "Nairobi, Kenya", "x");
        event.user_id = None;
        aggregator.apply(&event);
        let mut again = event.clone();
        again.id = "b".to_string();
        let snapshot = aggregator.apply(&again);
        assert_eq!(snapshot.unique_users, 1);
        assert_eq!(snapshot.repeat_scans, 1);
    }
}
