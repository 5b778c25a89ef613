// Aggregate snapshot entity
// Derived view over the event log, rebuildable by full replay

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSnapshot {
    /// Bumped on every applied event; equal snapshots replayed in any order
    /// end at the same version.
    pub version: u64,
    pub total_scans: u64,
    pub unique_users: u64,
    pub repeat_scans: u64,
    pub avg_session_minutes: f64,
    pub qr_scans: u64,
    pub nfc_scans: u64,
    pub top_locations: Vec<LocationCount>,
    pub hourly_histogram: [u64; 24],
}

impl Default for AggregateSnapshot {
    fn default() -> Self {
        Self {
            version: 0,
            total_scans: 0,
            unique_users: 0,
            repeat_scans: 0,
            avg_session_minutes: 0.0,
            qr_scans: 0,
            nfc_scans: 0,
            top_locations: Vec::new(),
            hourly_histogram: [0; 24],
        }
    }
}
