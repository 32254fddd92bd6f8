//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceSection,

    /// Scheduling windows
    #[serde(default)]
    pub schedule: RawScheduleSection,

    /// Push delivery; notifications are only logged when absent
    #[serde(default)]
    pub push: Option<RawPushSection>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceSection {
    /// HTTP listen address (default: 127.0.0.1:8087)
    pub listen_addr: Option<String>,

    /// Data directory for the document store
    pub data_dir: Option<PathBuf>,
}

/// Scheduling windows
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawScheduleSection {
    /// Time after the scheduled start before an unstarted walk expires
    pub grace_period_seconds: Option<u64>,

    /// Lead applied to requests whose start time is already in the past
    pub late_request_lead_seconds: Option<u64>,
}

/// Push delivery endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPushSection {
    /// HTTP(S) endpoint that accepts push messages
    pub endpoint: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Per-request timeout
    pub timeout_seconds: Option<u64>,
}
