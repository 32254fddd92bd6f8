//! Audit event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use walksched_api::JobKind;
use walksched_util::{JobId, WalkId};

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped {
        /// Jobs still pending at shutdown; they are lost
        pending_walks: usize,
    },

    /// Activation and timeout jobs installed for a walk
    WalkScheduled {
        walk_id: WalkId,
        activation_at: DateTime<Utc>,
        timeout_at: DateTime<Utc>,
        rescheduled: bool,
    },

    /// Activation committed
    WalkActivated { walk_id: WalkId, job_id: JobId },

    /// Expiration committed
    WalkExpired { walk_id: WalkId, job_id: JobId },

    /// A job fired but its precondition no longer held
    JobSkipped {
        walk_id: WalkId,
        job_id: JobId,
        kind: JobKind,
        reason: String,
    },

    /// A job fired and failed against the store
    JobFailed {
        walk_id: WalkId,
        job_id: JobId,
        kind: JobKind,
        error: String,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: walksched_util::now(),
            event,
        }
    }
}
