//! Shared types for the walksched API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use walksched_util::{JobId, WalkId};

/// Lifecycle status of a walk, as stored in the walk document's `status` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkStatus {
    Requested,
    Accepted,
    Started,
    Completed,
    CancelledByInitiator,
    CancelledByCounterparty,
    Expired,
}

impl WalkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkStatus::Requested => "requested",
            WalkStatus::Accepted => "accepted",
            WalkStatus::Started => "started",
            WalkStatus::Completed => "completed",
            WalkStatus::CancelledByInitiator => "cancelled_by_initiator",
            WalkStatus::CancelledByCounterparty => "cancelled_by_counterparty",
            WalkStatus::Expired => "expired",
        }
    }

    /// Whether the walk's fate has been decided and nothing can move it again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WalkStatus::Completed
                | WalkStatus::CancelledByInitiator
                | WalkStatus::CancelledByCounterparty
                | WalkStatus::Expired
        )
    }
}

impl fmt::Display for WalkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown walk status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for WalkStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(WalkStatus::Requested),
            "accepted" => Ok(WalkStatus::Accepted),
            "started" => Ok(WalkStatus::Started),
            "completed" => Ok(WalkStatus::Completed),
            "cancelled_by_initiator" => Ok(WalkStatus::CancelledByInitiator),
            "cancelled_by_counterparty" => Ok(WalkStatus::CancelledByCounterparty),
            "expired" => Ok(WalkStatus::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// The two kinds of deferred job scheduled per walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Activation,
    Timeout,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Activation => "activation",
            JobKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single timer-backed job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for its instant
    Pending,
    /// Instant reached; the body has been handed to the executor
    Fired,
    /// Cancelled before firing
    Cancelled,
}

/// Diagnostics view of one registered job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSlotView {
    pub job_id: JobId,
    pub kind: JobKind,
    pub fire_at: DateTime<Utc>,
    pub state: JobState,
}

/// Diagnostics view of the jobs registered for a walk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub walk_id: WalkId,
    pub activation: Option<JobSlotView>,
    pub timeout: Option<JobSlotView>,
}

/// Service health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub api_version: u32,
    pub store_healthy: bool,
    pub live_walks: usize,
}
