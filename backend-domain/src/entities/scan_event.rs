// Scan event entity
// An accepted scan is immutable and owned by the event store

use serde::{Deserialize, Serialize};

use crate::value_objects::{ScanType, UserKey};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEventInput {
    pub id: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub timestamp: i64,
    pub location: String,
    pub device_fingerprint: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub timestamp: i64,
    pub location: String,
    pub device_fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ScanEvent {
    pub fn user_key(&self) -> UserKey {
        UserKey::from_parts(self.user_id.as_deref(), &self.device_fingerprint)
    }
}

impl From<ScanEventInput> for ScanEvent {
    fn from(input: ScanEventInput) -> Self {
        Self {
            id: input.id.trim().to_string(),
            scan_type: input.scan_type,
            timestamp: input.timestamp,
            location: input.location.trim().to_string(),
            device_fingerprint: input.device_fingerprint.trim().to_string(),
            user_id: input
                .user_id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToString::to_string),
        }
    }
}

/// Event plus its position in the append-only log.
#[derive(Debug, Clone)]
pub struct StoredScanEvent {
    pub cursor: u64,
    pub event: ScanEvent,
}
