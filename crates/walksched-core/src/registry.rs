//! Registry of live job pairs, keyed by walk ID

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;
use walksched_api::{JobKind, JobSlotView, JobView};
use walksched_util::{JobId, WalkId};

use crate::TimerHandle;

/// One registered job: its identity plus the timer that will run it
#[derive(Debug, Clone)]
pub struct JobSlot {
    pub job_id: JobId,
    pub kind: JobKind,
    pub fire_at: DateTime<Utc>,
    pub timer: TimerHandle,
}

impl JobSlot {
    pub fn new(job_id: JobId, kind: JobKind, timer: TimerHandle) -> Self {
        Self {
            job_id,
            kind,
            fire_at: timer.fire_at(),
            timer,
        }
    }

    fn view(&self) -> JobSlotView {
        JobSlotView {
            job_id: self.job_id,
            kind: self.kind,
            fire_at: self.fire_at,
            state: self.timer.state(),
        }
    }
}

/// The activation and timeout jobs of one walk.
///
/// A slot becomes `None` once its job has run and released it.
#[derive(Debug, Clone, Default)]
pub struct JobPair {
    pub activation: Option<JobSlot>,
    pub timeout: Option<JobSlot>,
}

impl JobPair {
    pub fn new(activation: JobSlot, timeout: JobSlot) -> Self {
        Self {
            activation: Some(activation),
            timeout: Some(timeout),
        }
    }

    fn slot_mut(&mut self, kind: JobKind) -> &mut Option<JobSlot> {
        match kind {
            JobKind::Activation => &mut self.activation,
            JobKind::Timeout => &mut self.timeout,
        }
    }

    fn slots(&self) -> impl Iterator<Item = &JobSlot> {
        self.activation.iter().chain(self.timeout.iter())
    }

    /// Cancel every slot still waiting; returns how many were cancelled
    fn cancel(&self) -> usize {
        self.slots().filter(|slot| slot.timer.cancel()).count()
    }

    fn is_empty(&self) -> bool {
        self.activation.is_none() && self.timeout.is_none()
    }
}

/// Map from walk ID to the single live job pair of that walk.
///
/// Every operation takes the lock briefly and never across an await, so the
/// registry is safe to share between the HTTP handlers and the timer tasks.
#[derive(Debug, Default)]
pub struct JobRegistry {
    entries: Mutex<HashMap<WalkId, JobPair>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WalkId, JobPair>> {
        // The map stays consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `pair` for `walk_id`, cancelling any pair it supersedes.
    ///
    /// Returns `true` if an earlier pair was replaced.
    pub fn replace(&self, walk_id: WalkId, pair: JobPair) -> bool {
        let previous = self.lock().insert(walk_id.clone(), pair);

        match previous {
            Some(old) => {
                let cancelled = old.cancel();
                debug!(walk_id = %walk_id, cancelled, "Superseded earlier job pair");
                true
            }
            None => false,
        }
    }

    /// Cancel and forget the pair for `walk_id`
    pub fn remove(&self, walk_id: &WalkId) -> bool {
        let removed = self.lock().remove(walk_id);
        match removed {
            Some(pair) => {
                pair.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop the slot of a job that has finished running.
    ///
    /// Only the slot holding `job_id` is cleared, so a job from a superseded
    /// pair never touches its replacement. The entry goes away once both
    /// jobs have released their slots, so a sibling that fired but is still
    /// running keeps the walk registered. Returns `true` if the slot was found.
    pub fn release(&self, walk_id: &WalkId, kind: JobKind, job_id: JobId) -> bool {
        let mut entries = self.lock();
        let Some(pair) = entries.get_mut(walk_id) else {
            return false;
        };

        let slot = pair.slot_mut(kind);
        if slot.as_ref().map(|s| s.job_id) != Some(job_id) {
            return false;
        }
        *slot = None;

        if pair.is_empty() {
            entries.remove(walk_id);
        }
        true
    }

    /// Diagnostics view of the pair registered for `walk_id`
    pub fn get(&self, walk_id: &WalkId) -> Option<JobView> {
        self.lock().get(walk_id).map(|pair| JobView {
            walk_id: walk_id.clone(),
            activation: pair.activation.as_ref().map(JobSlot::view),
            timeout: pair.timeout.as_ref().map(JobSlot::view),
        })
    }

    pub fn contains(&self, walk_id: &WalkId) -> bool {
        self.lock().contains_key(walk_id)
    }

    /// Number of jobs still waiting to fire, across all walks
    pub fn pending_jobs(&self) -> usize {
        self.lock()
            .values()
            .flat_map(JobPair::slots)
            .filter(|slot| slot.timer.is_pending())
            .count()
    }

    /// Number of walks with a registered pair
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cancel everything; returns the number of walks that were registered
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        for (_, pair) in &drained {
            pair.cancel();
        }
        drained.len()
    }
}
