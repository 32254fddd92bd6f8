//! Routes and handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::debug;
use walksched_api::{API_VERSION, HealthStatus, JobView, ScheduleRequest, ScheduleResponse};
use walksched_core::Scheduler;
use walksched_store::Store;
use walksched_util::WalkId;

use crate::{HttpError, HttpResult};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

/// Build the service router
pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route("/schedule", post(schedule))
        .route("/jobs/{walk_id}", get(jobs).delete(cancel))
        .route("/health", get(health))
        .with_state(AppState { scheduler })
}

/// POST /schedule
async fn schedule(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> HttpResult<Json<ScheduleResponse>> {
    let Json(request) = payload?;
    debug!(walk_id = ?request.walk_id, scheduled_at = ?request.scheduled_at, "Schedule request");

    let outcome = state
        .scheduler
        .schedule_walk(&request, walksched_util::now())
        .await?;
    Ok(Json(outcome.to_response()))
}

/// GET /jobs/{walk_id}
async fn jobs(
    State(state): State<AppState>,
    Path(walk_id): Path<String>,
) -> HttpResult<Json<JobView>> {
    let walk_id = WalkId::new(walk_id);
    state
        .scheduler
        .jobs(&walk_id)
        .map(Json)
        .ok_or_else(|| HttpError::NotFound(format!("no jobs registered for walk {}", walk_id)))
}

/// DELETE /jobs/{walk_id}
async fn cancel(
    State(state): State<AppState>,
    Path(walk_id): Path<String>,
) -> HttpResult<StatusCode> {
    let walk_id = WalkId::new(walk_id);
    if state.scheduler.cancel_walk(&walk_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(HttpError::NotFound(format!("no jobs registered for walk {}", walk_id)))
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        api_version: API_VERSION,
        store_healthy: state.scheduler.store().is_healthy(),
        live_walks: state.scheduler.live_walks(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, header};
    use axum::response::Response;
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use walksched_config::ScheduleConfig;
    use walksched_notify::MockTransport;
    use walksched_store::SqliteStore;

    fn test_scheduler() -> Arc<Scheduler> {
        Arc::new(Scheduler::new(
            Arc::new(SqliteStore::in_memory().unwrap()),
            Arc::new(MockTransport::new()),
            ScheduleConfig::default(),
        ))
    }

    fn post_json(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn schedule_returns_instants() {
        let scheduler = test_scheduler();
        let app = router(scheduler.clone());
        let at = Utc::now() + Duration::hours(1);

        let body = json!({
            "walkId": "W1",
            "initiatorId": "alice",
            "counterpartyId": "bob",
            "scheduledAt": at.to_rfc3339(),
        });
        let response = app
            .oneshot(post_json("/schedule", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["walkId"], "W1");
        assert_eq!(json["rescheduled"], false);
        assert!(json["activationInstant"].is_string());
        assert!(json["timeoutInstant"].is_string());
        assert_eq!(scheduler.live_walks(), 1);
    }

    #[tokio::test]
    async fn schedule_accepts_entity_field_names() {
        let scheduler = test_scheduler();
        let app = router(scheduler.clone());
        let at = Utc::now() + Duration::hours(1);

        let body = json!({
            "entityId": "W7",
            "initiatorId": "alice",
            "counterpartyId": "bob",
            "requestedInstantISO8601": at.to_rfc3339(),
        });
        let response = app
            .oneshot(post_json("/schedule", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["walkId"], "W7");
        let activation: chrono::DateTime<Utc> =
            json["activationInstant"].as_str().unwrap().parse().unwrap();
        assert_eq!(activation, at);
        assert!(scheduler.jobs(&WalkId::new("W7")).is_some());
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let app = router(test_scheduler());
        let body = json!({"walkId": "W1", "initiatorId": "alice", "scheduledAt": "2030-01-01T10:00:00Z"});

        let response = app
            .oneshot(post_json("/schedule", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "invalid_request");
        assert!(json["message"].as_str().unwrap().contains("counterpartyId"));
    }

    #[tokio::test]
    async fn malformed_instant_is_bad_request() {
        let app = router(test_scheduler());
        let body = json!({
            "walkId": "W1",
            "initiatorId": "alice",
            "counterpartyId": "bob",
            "scheduledAt": "tomorrow-ish",
        });

        let response = app
            .oneshot(post_json("/schedule", body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request() {
        let app = router(test_scheduler());
        let response = app
            .oneshot(post_json("/schedule", "{not json".into()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "invalid_request");
    }

    #[tokio::test]
    async fn jobs_view_and_not_found() {
        let scheduler = test_scheduler();
        let app = router(scheduler.clone());

        let response = app.clone().oneshot(get_req("/jobs/W1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "walk_not_found");

        let now = Utc::now();
        let request = ScheduleRequest::new("W1", "alice", "bob", (now + Duration::hours(1)).to_rfc3339());
        scheduler.schedule_walk(&request, now).await.unwrap();

        let response = app.oneshot(get_req("/jobs/W1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["walkId"], "W1");
        assert_eq!(json["activation"]["state"], "pending");
        assert_eq!(json["timeout"]["kind"], "timeout");
    }

    #[tokio::test]
    async fn delete_cancels_pending_jobs() {
        let scheduler = test_scheduler();
        let app = router(scheduler.clone());

        let now = Utc::now();
        let request = ScheduleRequest::new("W1", "alice", "bob", (now + Duration::hours(1)).to_rfc3339());
        let outcome = scheduler.schedule_walk(&request, now).await.unwrap();
        let activation = scheduler.registry().get(&WalkId::new("W1")).unwrap().activation.unwrap();
        assert_eq!(activation.job_id, outcome.activation_job);

        let delete = || {
            Request::builder()
                .method(Method::DELETE)
                .uri("/jobs/W1")
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(scheduler.live_walks(), 0);
        assert_eq!(scheduler.registry().pending_jobs(), 0);

        let response = app.oneshot(delete()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_reports_store_and_walks() {
        let app = router(test_scheduler());
        let response = app.oneshot(get_req("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["storeHealthy"], true);
        assert_eq!(json["liveWalks"], 0);
        assert_eq!(json["apiVersion"], API_VERSION);
    }
}
