// Contest entry entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestEntry {
    pub entry_id: Uuid,
    pub contest_id: String,
    pub entrant_id: String,
    pub claimed_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_event_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub entrant_id: String,
    #[serde(default)]
    pub scan_event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContestStatus {
    pub contest_id: String,
    pub entries: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claimed: Option<bool>,
}
