//! Job payloads

use walksched_api::ValidatedSchedule;
use walksched_util::{UserId, WalkId};

/// What a job needs to know about its walk, captured when it is scheduled.
///
/// Immutable once created; the walk's current state is always re-read from
/// the store when the job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub walk_id: WalkId,
    pub initiator_id: UserId,
    pub counterparty_id: UserId,
}

impl JobContext {
    pub fn new(walk_id: WalkId, initiator_id: UserId, counterparty_id: UserId) -> Self {
        Self {
            walk_id,
            initiator_id,
            counterparty_id,
        }
    }

    /// Both parties, initiator first
    pub fn parties(&self) -> [&UserId; 2] {
        [&self.initiator_id, &self.counterparty_id]
    }
}

impl From<&ValidatedSchedule> for JobContext {
    fn from(request: &ValidatedSchedule) -> Self {
        Self::new(
            request.walk_id.clone(),
            request.initiator_id.clone(),
            request.counterparty_id.clone(),
        )
    }
}
