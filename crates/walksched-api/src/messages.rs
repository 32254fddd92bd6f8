//! Request and response payloads for the walksched HTTP surface

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walksched_util::{UserId, WalkId, parse_instant};

use crate::API_VERSION;

/// Body of `POST /schedule`.
///
/// Every field is optional on the wire so that a missing field surfaces as a
/// validation error naming the field instead of a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default, alias = "entityId")]
    pub walk_id: Option<String>,
    #[serde(default)]
    pub initiator_id: Option<String>,
    #[serde(default)]
    pub counterparty_id: Option<String>,
    /// Requested start, ISO-8601
    #[serde(
        default,
        alias = "requestedInstantISO8601",
        alias = "requestedInstant",
        alias = "scheduledTime"
    )]
    pub scheduled_at: Option<String>,
}

impl ScheduleRequest {
    pub fn new(
        walk_id: impl Into<String>,
        initiator_id: impl Into<String>,
        counterparty_id: impl Into<String>,
        scheduled_at: impl Into<String>,
    ) -> Self {
        Self {
            walk_id: Some(walk_id.into()),
            initiator_id: Some(initiator_id.into()),
            counterparty_id: Some(counterparty_id.into()),
            scheduled_at: Some(scheduled_at.into()),
        }
    }

    /// Check presence and shape of every field
    pub fn validate(&self) -> Result<ValidatedSchedule, RequestError> {
        let walk_id = required("walkId", &self.walk_id)?;
        let initiator_id = required("initiatorId", &self.initiator_id)?;
        let counterparty_id = required("counterpartyId", &self.counterparty_id)?;
        let scheduled_at = required("scheduledAt", &self.scheduled_at)?;

        if initiator_id == counterparty_id {
            return Err(RequestError::SameParty);
        }

        let requested_at = parse_instant(scheduled_at).map_err(|e| RequestError::MalformedField {
            field: "scheduledAt",
            reason: e.to_string(),
        })?;

        Ok(ValidatedSchedule {
            walk_id: WalkId::new(walk_id),
            initiator_id: UserId::new(initiator_id),
            counterparty_id: UserId::new(counterparty_id),
            requested_at,
        })
    }
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, RequestError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(RequestError::MissingField(field)),
    }
}

/// A schedule request whose fields have all been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSchedule {
    pub walk_id: WalkId,
    pub initiator_id: UserId,
    pub counterparty_id: UserId,
    pub requested_at: DateTime<Utc>,
}

/// Reasons a schedule request is rejected before any job is created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("malformed field '{field}': {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("initiator and counterparty must be different users")]
    SameParty,
}

/// Body of a successful `POST /schedule`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub walk_id: WalkId,
    #[serde(alias = "activationAt")]
    pub activation_instant: DateTime<Utc>,
    #[serde(alias = "timeoutAt")]
    pub timeout_instant: DateTime<Utc>,
    /// True when an earlier schedule for the same walk was cancelled
    pub rescheduled: bool,
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub api_version: u32,
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION,
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    WalkNotFound,
    StoreError,
    InternalError,
}
