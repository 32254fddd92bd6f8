//! Activation and timeout executors
//!
//! Both executors follow the same shape: re-check the walk through the
//! state guard, commit every mutation in one batch, then notify the parties
//! on a best-effort basis. A failed step is reported and never retried.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use walksched_api::{JobKind, WalkStatus};
use walksched_notify::{Notification, PushTransport, token_suffix};
use walksched_store::{
    AuditEvent, AuditEventType, DocumentWrite, Store, StoreResult, UserRecord, WalkRecord,
    collections, fields,
};
use walksched_util::{JobId, UserId};

use crate::{JobContext, JobOutcome, JobRegistry, JobReport, Precondition, StateGuard, messages};

/// Shared dependencies of every fired job
#[derive(Clone)]
pub struct JobRuntime {
    store: Arc<dyn Store>,
    transport: Arc<dyn PushTransport>,
    registry: Arc<JobRegistry>,
    reports: broadcast::Sender<JobReport>,
}

impl JobRuntime {
    pub fn new(
        store: Arc<dyn Store>,
        transport: Arc<dyn PushTransport>,
        registry: Arc<JobRegistry>,
        reports: broadcast::Sender<JobReport>,
    ) -> Self {
        Self {
            store,
            transport,
            registry,
            reports,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Run a fired job to completion, release its slot and report the outcome
    pub async fn run(&self, job_id: JobId, kind: JobKind, ctx: &JobContext) -> JobOutcome {
        debug!(job_id = %job_id, walk_id = %ctx.walk_id, kind = %kind, "Job fired");

        let result = match kind {
            JobKind::Activation => self.activate(ctx).await,
            JobKind::Timeout => self.expire(ctx).await,
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => JobOutcome::Failed(e.to_string()),
        };

        self.registry.release(&ctx.walk_id, kind, job_id);
        self.report(JobReport {
            job_id,
            walk_id: ctx.walk_id.clone(),
            kind,
            outcome: outcome.clone(),
        })
        .await;

        outcome
    }

    async fn activate(&self, ctx: &JobContext) -> StoreResult<JobOutcome> {
        let guard = StateGuard::new(self.store.as_ref());
        if let Precondition::NotMet(reason) = guard.check_activation(&ctx.walk_id).await? {
            return Ok(JobOutcome::Skipped(reason));
        }

        let users = self.load_parties(ctx).await?;
        let now = walksched_util::now();

        let mut writes: Vec<DocumentWrite> = users
            .iter()
            .map(|user| {
                DocumentWrite::update(collections::USERS, user.id.as_str())
                    .set(fields::ACTIVE_WALK_ID, ctx.walk_id.as_str())
            })
            .collect();
        writes.push(
            DocumentWrite::update(collections::WALKS, ctx.walk_id.as_str())
                .set(fields::ACTIVATION_APPLIED, true)
                .set(fields::ACTIVATED_AT, timestamp(now)),
        );

        self.store.batch_write(writes).await?;
        info!(walk_id = %ctx.walk_id, "Walk activated");

        let notified = self
            .notify_all(&users, &messages::walk_started(&ctx.walk_id))
            .await;
        Ok(JobOutcome::Applied { notified })
    }

    async fn expire(&self, ctx: &JobContext) -> StoreResult<JobOutcome> {
        let guard = StateGuard::new(self.store.as_ref());
        let walk = match guard.check_timeout(&ctx.walk_id).await? {
            Precondition::Met(walk) => walk,
            Precondition::NotMet(reason) => return Ok(JobOutcome::Skipped(reason)),
        };

        let users = self.load_parties(ctx).await?;
        let now = walksched_util::now();

        let mut writes = vec![expired_write(collections::WALKS, ctx.walk_id.as_str(), now)];
        if let Some(request_id) = self.linked_request(&walk).await? {
            writes.push(expired_write(collections::WALK_REQUESTS, &request_id, now));
        }
        for user in &users {
            if user.active_walk_id.as_ref() == Some(&ctx.walk_id) {
                writes.push(
                    DocumentWrite::update(collections::USERS, user.id.as_str())
                        .delete(fields::ACTIVE_WALK_ID),
                );
            }
        }

        self.store.batch_write(writes).await?;
        info!(walk_id = %ctx.walk_id, "Walk expired");

        let notified = self
            .notify_all(&users, &messages::walk_expired(&ctx.walk_id))
            .await;
        Ok(JobOutcome::Applied { notified })
    }

    /// Party documents that exist; a missing user is left out of the batch
    async fn load_parties(&self, ctx: &JobContext) -> StoreResult<Vec<UserRecord>> {
        let mut users = Vec::with_capacity(2);
        for party in ctx.parties() {
            match self.load_user(party).await? {
                Some(user) => users.push(user),
                None => warn!(walk_id = %ctx.walk_id, user_id = %party, "Walk party not found"),
            }
        }
        Ok(users)
    }

    async fn load_user(&self, id: &UserId) -> StoreResult<Option<UserRecord>> {
        self.store
            .get(collections::USERS, id.as_str())
            .await?
            .map(|doc| UserRecord::from_document(id, &doc))
            .transpose()
    }

    async fn linked_request(&self, walk: &WalkRecord) -> StoreResult<Option<String>> {
        let Some(request_id) = walk.request_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        if self
            .store
            .get(collections::WALK_REQUESTS, request_id)
            .await?
            .is_some()
        {
            Ok(Some(request_id.to_string()))
        } else {
            debug!(walk_id = %walk.id, request_id, "Linked walk request not found");
            Ok(None)
        }
    }

    /// Send to every party that has a token; returns the number delivered
    async fn notify_all(&self, users: &[UserRecord], notification: &Notification) -> usize {
        let mut delivered = 0;
        for user in users {
            let Some(token) = user.token() else {
                debug!(user_id = %user.id, "No push token, skipping notification");
                continue;
            };

            match self.transport.send(token, notification).await {
                Ok(receipt) => {
                    debug!(
                        user_id = %user.id,
                        transport = self.transport.name(),
                        message_id = ?receipt.message_id,
                        "Notification delivered"
                    );
                    delivered += 1;
                }
                Err(e) => {
                    warn!(
                        user_id = %user.id,
                        token_suffix = %token_suffix(token),
                        transport = self.transport.name(),
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }
        delivered
    }

    async fn report(&self, report: JobReport) {
        let event = match &report.outcome {
            JobOutcome::Applied { notified } => {
                info!(
                    job_id = %report.job_id,
                    walk_id = %report.walk_id,
                    kind = %report.kind,
                    notified,
                    "Job applied"
                );
                match report.kind {
                    JobKind::Activation => AuditEventType::WalkActivated {
                        walk_id: report.walk_id.clone(),
                        job_id: report.job_id,
                    },
                    JobKind::Timeout => AuditEventType::WalkExpired {
                        walk_id: report.walk_id.clone(),
                        job_id: report.job_id,
                    },
                }
            }
            JobOutcome::Skipped(reason) => {
                debug!(
                    job_id = %report.job_id,
                    walk_id = %report.walk_id,
                    kind = %report.kind,
                    reason = %reason,
                    "Job skipped"
                );
                AuditEventType::JobSkipped {
                    walk_id: report.walk_id.clone(),
                    job_id: report.job_id,
                    kind: report.kind,
                    reason: reason.to_string(),
                }
            }
            JobOutcome::Failed(message) => {
                error!(
                    job_id = %report.job_id,
                    walk_id = %report.walk_id,
                    kind = %report.kind,
                    error = %message,
                    "Job failed"
                );
                AuditEventType::JobFailed {
                    walk_id: report.walk_id.clone(),
                    job_id: report.job_id,
                    kind: report.kind,
                    error: message.clone(),
                }
            }
        };

        if let Err(e) = self.store.append_audit(AuditEvent::new(event)).await {
            warn!(error = %e, "Failed to record job outcome in audit log");
        }

        // No subscribers is fine
        let _ = self.reports.send(report);
    }
}

fn expired_write(collection: &str, id: &str, now: DateTime<Utc>) -> DocumentWrite {
    DocumentWrite::update(collection, id)
        .set(fields::STATUS, WalkStatus::Expired.as_str())
        .set(fields::EXPIRED_AT, timestamp(now))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}
