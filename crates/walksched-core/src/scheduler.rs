//! Scheduling facade

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};
use walksched_api::{JobKind, JobView, ScheduleRequest, ScheduleResponse};
use walksched_config::ScheduleConfig;
use walksched_notify::PushTransport;
use walksched_store::{AuditEvent, AuditEventType, Store};
use walksched_util::{JobId, WalkId, clamp_to_future, to_chrono};

use crate::{
    CoreError, CoreResult, JobContext, JobPair, JobRegistry, JobReport, JobRuntime, JobSlot, Timer,
};

const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Result of installing a job pair for a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleOutcome {
    pub walk_id: WalkId,
    pub activation_at: DateTime<Utc>,
    pub timeout_at: DateTime<Utc>,
    pub activation_job: JobId,
    pub timeout_job: JobId,
    /// An earlier pair for the same walk was cancelled
    pub rescheduled: bool,
    /// The requested instant was in the past and got moved forward
    pub clamped: bool,
}

impl ScheduleOutcome {
    pub fn to_response(&self) -> ScheduleResponse {
        ScheduleResponse {
            walk_id: self.walk_id.clone(),
            activation_instant: self.activation_at,
            timeout_instant: self.timeout_at,
            rescheduled: self.rescheduled,
        }
    }
}

/// Installs, supersedes and cancels the activation/timeout pair of each walk
pub struct Scheduler {
    config: ScheduleConfig,
    timer: Timer,
    registry: Arc<JobRegistry>,
    runtime: JobRuntime,
    reports: broadcast::Sender<JobReport>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn PushTransport>,
        config: ScheduleConfig,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let runtime = JobRuntime::new(store, transport, registry.clone(), reports.clone());

        info!(
            grace_period_secs = config.grace_period.as_secs(),
            late_request_lead_secs = config.late_request_lead.as_secs(),
            "Scheduler initialized"
        );

        Self {
            config,
            timer: Timer::new(),
            registry,
            runtime,
            reports,
        }
    }

    /// Receive a report for every job that fires from now on
    pub fn subscribe(&self) -> broadcast::Receiver<JobReport> {
        self.reports.subscribe()
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        self.runtime.store()
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Validate a request and install the walk's activation and timeout jobs.
    ///
    /// Scheduling a walk that already has jobs replaces them. Nothing is
    /// created if the request is invalid.
    pub async fn schedule_walk(
        &self,
        request: &ScheduleRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<ScheduleOutcome> {
        let request = request.validate()?;

        let activation_at = clamp_to_future(request.requested_at, now, self.config.late_request_lead);
        let clamped = activation_at != request.requested_at;
        let timeout_at = activation_at
            .checked_add_signed(to_chrono(self.config.grace_period))
            .ok_or_else(|| {
                CoreError::Internal(format!("timeout instant out of range for {}", activation_at))
            })?;

        let ctx = Arc::new(JobContext::from(&request));
        let (armed, armed_rx) = watch::channel(false);
        let activation = self.spawn_job(
            JobKind::Activation,
            activation_at,
            now,
            ctx.clone(),
            armed_rx.clone(),
        );
        let timeout = self.spawn_job(JobKind::Timeout, timeout_at, now, ctx, armed_rx);
        let outcome = ScheduleOutcome {
            walk_id: request.walk_id.clone(),
            activation_at,
            timeout_at,
            activation_job: activation.job_id,
            timeout_job: timeout.job_id,
            rescheduled: false,
            clamped,
        };

        let rescheduled = self
            .registry
            .replace(request.walk_id.clone(), JobPair::new(activation, timeout));
        // Jobs run only once their slots are registered
        armed.send_replace(true);

        info!(
            walk_id = %request.walk_id,
            activation_at = %activation_at,
            timeout_at = %timeout_at,
            rescheduled,
            clamped,
            "Walk scheduled"
        );

        let event = AuditEventType::WalkScheduled {
            walk_id: request.walk_id,
            activation_at,
            timeout_at,
            rescheduled,
        };
        if let Err(e) = self.store().append_audit(AuditEvent::new(event)).await {
            warn!(error = %e, "Failed to record schedule in audit log");
        }

        Ok(ScheduleOutcome {
            rescheduled,
            ..outcome
        })
    }

    fn spawn_job(
        &self,
        kind: JobKind,
        fire_at: DateTime<Utc>,
        now: DateTime<Utc>,
        ctx: Arc<JobContext>,
        mut armed: watch::Receiver<bool>,
    ) -> JobSlot {
        let job_id = JobId::new();
        let runtime = self.runtime.clone();
        let handle = self.timer.schedule(fire_at, now, async move {
            if armed.wait_for(|armed| *armed).await.is_err() {
                return;
            }
            runtime.run(job_id, kind, &ctx).await;
        });
        JobSlot::new(job_id, kind, handle)
    }

    /// Cancel any jobs still pending for a walk
    pub fn cancel_walk(&self, walk_id: &WalkId) -> bool {
        let cancelled = self.registry.remove(walk_id);
        if cancelled {
            info!(walk_id = %walk_id, "Walk jobs cancelled");
        }
        cancelled
    }

    pub fn jobs(&self, walk_id: &WalkId) -> Option<JobView> {
        self.registry.get(walk_id)
    }

    /// Walks with at least one registered job
    pub fn live_walks(&self) -> usize {
        self.registry.len()
    }

    /// Cancel everything still pending and record the stop.
    ///
    /// Pending jobs are not persisted; they are lost.
    pub async fn shutdown(&self) -> usize {
        let pending_walks = self.registry.cancel_all();
        info!(pending_walks, "Scheduler stopped");

        let event = AuditEventType::ServiceStopped { pending_walks };
        if let Err(e) = self.store().append_audit(AuditEvent::new(event)).await {
            warn!(error = %e, "Failed to record shutdown in audit log");
        }
        pending_walks
    }
}
