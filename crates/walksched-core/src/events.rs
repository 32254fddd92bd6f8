//! Job outcome reports

use walksched_api::JobKind;
use walksched_util::{JobId, WalkId};

use crate::SkipReason;

/// How a fired job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Mutations committed; `notified` parties received a push
    Applied { notified: usize },

    /// Precondition did not hold, nothing was written
    Skipped(SkipReason),

    /// A store operation failed, nothing was written
    Failed(String),
}

impl JobOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, JobOutcome::Applied { .. })
    }
}

/// Published once per fired job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub walk_id: WalkId,
    pub kind: JobKind,
    pub outcome: JobOutcome,
}
