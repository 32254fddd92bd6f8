//! Configuration validation

use crate::schema::{RawConfig, RawPushSection};
use std::net::SocketAddr;
use thiserror::Error;

/// Upper bound for the grace period; anything longer is almost certainly a typo
const MAX_GRACE_PERIOD_SECS: u64 = 24 * 60 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Invalid listen address '{value}': {message}")]
    InvalidListenAddr { value: String, message: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("grace_period_seconds {0} exceeds the maximum of {MAX_GRACE_PERIOD_SECS}")]
    GracePeriodTooLong(u64),

    #[error("late_request_lead_seconds {lead} must be shorter than grace_period_seconds {grace}")]
    LeadExceedsGrace { lead: u64, grace: u64 },

    #[error("Push config error: {0}")]
    PushError(String),
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(addr) = &config.service.listen_addr
        && let Err(e) = addr.parse::<SocketAddr>()
    {
        errors.push(ValidationError::InvalidListenAddr {
            value: addr.clone(),
            message: e.to_string(),
        });
    }

    let grace = config
        .schedule
        .grace_period_seconds
        .unwrap_or(crate::DEFAULT_GRACE_PERIOD_SECS);
    let lead = config
        .schedule
        .late_request_lead_seconds
        .unwrap_or(crate::DEFAULT_LATE_REQUEST_LEAD_SECS);

    if grace == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "grace_period_seconds",
        });
    } else if grace > MAX_GRACE_PERIOD_SECS {
        errors.push(ValidationError::GracePeriodTooLong(grace));
    }

    if lead == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "late_request_lead_seconds",
        });
    } else if grace > 0 && lead >= grace {
        errors.push(ValidationError::LeadExceedsGrace { lead, grace });
    }

    if let Some(push) = &config.push {
        errors.extend(validate_push(push));
    }

    errors
}

fn validate_push(push: &RawPushSection) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let endpoint = push.endpoint.trim();
    if endpoint.is_empty() {
        errors.push(ValidationError::PushError("endpoint cannot be empty".into()));
    } else if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        errors.push(ValidationError::PushError(format!(
            "endpoint '{}' must be an http:// or https:// URL",
            endpoint
        )));
    }

    if let Some(var) = &push.api_key_env
        && var.trim().is_empty()
    {
        errors.push(ValidationError::PushError(
            "api_key_env cannot be empty".into(),
        ));
    }

    if push.timeout_seconds == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: "push.timeout_seconds",
        });
    }

    errors
}
