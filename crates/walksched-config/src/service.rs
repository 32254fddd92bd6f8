//! Validated configuration structures

use crate::schema::{RawConfig, RawPushSection};
use crate::{DEFAULT_GRACE_PERIOD_SECS, DEFAULT_LATE_REQUEST_LEAD_SECS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use walksched_util::default_data_dir;

/// Default push request timeout
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 10;

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub schedule: ScheduleConfig,
    pub push: Option<PushConfig>,
}

impl ServiceConfig {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let listen_addr = raw
            .service
            .listen_addr
            .as_deref()
            .and_then(|a| a.parse().ok())
            .unwrap_or_else(default_listen_addr);

        let data_dir = raw.service.data_dir.unwrap_or_else(default_data_dir);

        let schedule = ScheduleConfig {
            grace_period: Duration::from_secs(
                raw.schedule
                    .grace_period_seconds
                    .unwrap_or(DEFAULT_GRACE_PERIOD_SECS),
            ),
            late_request_lead: Duration::from_secs(
                raw.schedule
                    .late_request_lead_seconds
                    .unwrap_or(DEFAULT_LATE_REQUEST_LEAD_SECS),
            ),
        };

        Self {
            listen_addr,
            data_dir,
            schedule,
            push: raw.push.map(PushConfig::from_raw),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            data_dir: default_data_dir(),
            schedule: ScheduleConfig::default(),
            push: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8087))
}

/// Scheduling windows used by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Time after activation before an unstarted walk expires
    pub grace_period: Duration,
    /// Lead applied to start times that are already in the past
    pub late_request_lead: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS),
            late_request_lead: Duration::from_secs(DEFAULT_LATE_REQUEST_LEAD_SECS),
        }
    }
}

/// Push delivery settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    pub endpoint: String,
    /// Environment variable the API key is read from at startup
    pub api_key_env: Option<String>,
    pub timeout: Duration,
}

impl PushConfig {
    fn from_raw(raw: RawPushSection) -> Self {
        Self {
            endpoint: raw.endpoint.trim().to_string(),
            api_key_env: raw.api_key_env,
            timeout: Duration::from_secs(raw.timeout_seconds.unwrap_or(DEFAULT_PUSH_TIMEOUT_SECS)),
        }
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        let var = self.api_key_env.as_ref()?;
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Some(key),
            _ => {
                tracing::warn!(env_var = %var, "Push API key variable is not set");
                None
            }
        }
    }
}
