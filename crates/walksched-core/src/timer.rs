//! One-shot cancellable timers
//!
//! Each timer owns a tokio task that sleeps until its instant and then runs
//! the job body on that same task, so a slow body never delays another
//! timer. Whether a timer fires or is cancelled is decided exactly once by a
//! compare-and-swap on its state.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Notify;
use walksched_api::JobState;
use walksched_util::saturating_duration_until;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

struct TimerInner {
    state: AtomicU8,
    cancelled: Notify,
    fire_at: DateTime<Utc>,
}

/// Handle to a scheduled timer.
///
/// Cloning the handle does not duplicate the timer.
#[derive(Clone)]
pub struct TimerHandle {
    inner: Arc<TimerInner>,
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("fire_at", &self.inner.fire_at)
            .field("state", &self.state())
            .finish()
    }
}

impl TimerHandle {
    /// Prevent the timer from firing.
    ///
    /// Returns `true` if this call cancelled a pending timer. Cancelling a
    /// timer that already fired or was already cancelled is a no-op, and a
    /// body that is already running is not interrupted.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .inner
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if cancelled {
            // Stores a permit if the task is not yet waiting
            self.inner.cancelled.notify_one();
        }
        cancelled
    }

    pub fn state(&self) -> JobState {
        match self.inner.state.load(Ordering::Acquire) {
            PENDING => JobState::Pending,
            FIRED => JobState::Fired,
            _ => JobState::Cancelled,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state() == JobState::Pending
    }

    pub fn fire_at(&self) -> DateTime<Utc> {
        self.inner.fire_at
    }
}

/// Spawns one-shot timers on the current tokio runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct Timer;

impl Timer {
    pub fn new() -> Self {
        Self
    }

    /// Run `body` once at or after `fire_at`.
    ///
    /// `now` is the wall-clock reference the delay is computed from; an
    /// instant at or before `now` fires as soon as the runtime gets to it.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, fire_at: DateTime<Utc>, now: DateTime<Utc>, body: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = Arc::new(TimerInner {
            state: AtomicU8::new(PENDING),
            cancelled: Notify::new(),
            fire_at,
        });
        let delay = saturating_duration_until(fire_at, now);

        let task_inner = inner.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = task_inner.cancelled.notified() => return,
            }

            if task_inner
                .state
                .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            body.await;
        });

        TimerHandle { inner }
    }
}
