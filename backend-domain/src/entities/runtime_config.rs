// Runtime configuration handed from infrastructure to every layer

use crate::services::{AggregatorConfig, TierPolicyConfig};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub data_dir: String,
    pub report_dir: String,
    pub top_locations_limit: usize,
    pub histogram_utc_offset_hours: i32,
    pub clock_skew_seconds: u64,
    pub reach_multiplier: u64,
    pub cost_per_scan: f64,
    pub value_per_scan: f64,
    pub storage_retry_max: u32,
    pub storage_retry_base_ms: u64,
    pub aggregate_queue_size: usize,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub report_hour: u32,
    pub report_minute: u32,
}

impl RuntimeConfig {
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            top_locations_limit: self.top_locations_limit,
            utc_offset_hours: self.histogram_utc_offset_hours,
        }
    }

    pub fn tier_policy_config(&self) -> TierPolicyConfig {
        TierPolicyConfig {
            reach_multiplier: self.reach_multiplier,
            cost_per_scan: self.cost_per_scan,
            value_per_scan: self.value_per_scan,
        }
    }
}
