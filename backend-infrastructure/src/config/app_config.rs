use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::RuntimeConfig;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4180".to_string(),
            api_token: None,
            data_dir: "./data".to_string(),
            report_dir: "./reports".to_string(),
            top_locations_limit: 10,
            histogram_utc_offset_hours: 0,
            clock_skew_seconds: 300,
            reach_multiplier: 10,
            cost_per_scan: 0.12,
            value_per_scan: 1.20,
            storage_retry_max: 2,
            storage_retry_base_ms: 50,
            aggregate_queue_size: 1024,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            report_hour: 0,
            report_minute: 5,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("KARDIVERSE_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.resolve_paths(base_dir);
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config = AppConfig::parse(&content)?;
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.data_dir = resolve_path(base, &self.data_dir);
        self.report_dir = resolve_path(base, &self.report_dir);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("data_dir must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.top_locations_limit == 0 {
            return Err(anyhow!("top_locations_limit must be greater than 0"));
        }
        if self.aggregate_queue_size == 0 {
            return Err(anyhow!("aggregate_queue_size must be greater than 0"));
        }
        if !(-23..=23).contains(&self.histogram_utc_offset_hours) {
            return Err(anyhow!("histogram_utc_offset_hours out of range"));
        }
        if !self.cost_per_scan.is_finite() || self.cost_per_scan < 0.0 {
            return Err(anyhow!("cost_per_scan must be a non-negative number"));
        }
        if !self.value_per_scan.is_finite() || self.value_per_scan < 0.0 {
            return Err(anyhow!("value_per_scan must be a non-negative number"));
        }
        if self.report_hour > 23 || self.report_minute > 59 {
            return Err(anyhow!("report_hour or report_minute out of range"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            data_dir: self.data_dir.clone(),
            report_dir: self.report_dir.clone(),
            top_locations_limit: self.top_locations_limit,
            histogram_utc_offset_hours: self.histogram_utc_offset_hours,
            clock_skew_seconds: self.clock_skew_seconds,
            reach_multiplier: self.reach_multiplier,
            cost_per_scan: self.cost_per_scan,
            value_per_scan: self.value_per_scan,
            storage_retry_max: self.storage_retry_max,
            storage_retry_base_ms: self.storage_retry_base_ms,
            aggregate_queue_size: self.aggregate_queue_size,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            report_hour: self.report_hour,
            report_minute: self.report_minute,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("KARDIVERSE_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("KARDIVERSE_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("KARDIVERSE_DATA_DIR") {
            self.data_dir = value;
        }
        if let Ok(value) = env::var("KARDIVERSE_REPORT_DIR") {
            self.report_dir = value;
        }
        if let Ok(value) = env::var("KARDIVERSE_TOP_LOCATIONS_LIMIT") {
            self.top_locations_limit = value.parse().unwrap_or(self.top_locations_limit);
        }
        if let Ok(value) = env::var("KARDIVERSE_HISTOGRAM_UTC_OFFSET_HOURS") {
            self.histogram_utc_offset_hours =
                value.parse().unwrap_or(self.histogram_utc_offset_hours);
        }
        if let Ok(value) = env::var("KARDIVERSE_CLOCK_SKEW_SECONDS") {
            self.clock_skew_seconds = value.parse().unwrap_or(self.clock_skew_seconds);
        }
        if let Ok(value) = env::var("KARDIVERSE_REACH_MULTIPLIER") {
            self.reach_multiplier = value.parse().unwrap_or(self.reach_multiplier);
        }
        if let Ok(value) = env::var("KARDIVERSE_COST_PER_SCAN") {
            self.cost_per_scan = value.parse().unwrap_or(self.cost_per_scan);
        }
        if let Ok(value) = env::var("KARDIVERSE_VALUE_PER_SCAN") {
            self.value_per_scan = value.parse().unwrap_or(self.value_per_scan);
        }
        if let Ok(value) = env::var("KARDIVERSE_STORAGE_RETRY_MAX") {
            self.storage_retry_max = value.parse().unwrap_or(self.storage_retry_max);
        }
        if let Ok(value) = env::var("KARDIVERSE_STORAGE_RETRY_BASE_MS") {
            self.storage_retry_base_ms = value.parse().unwrap_or(self.storage_retry_base_ms);
        }
        if let Ok(value) = env::var("KARDIVERSE_AGGREGATE_QUEUE_SIZE") {
            self.aggregate_queue_size = value.parse().unwrap_or(self.aggregate_queue_size);
        }
        if let Ok(value) = env::var("KARDIVERSE_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("KARDIVERSE_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("KARDIVERSE_REPORT_HOUR") {
            self.report_hour = value.parse().unwrap_or(self.report_hour);
        }
        if let Ok(value) = env::var("KARDIVERSE_REPORT_MINUTE") {
            self.report_minute = value.parse().unwrap_or(self.report_minute);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
