//! Integration tests for walkschedd
//!
//! These tests verify the end-to-end behavior of the service: a schedule
//! request over HTTP, timers firing on the real clock, store mutations and
//! push delivery through a local gateway.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use walksched_api::{JobKind, WalkStatus};
use walksched_config::{ScheduleConfig, parse_config};
use walksched_core::{JobOutcome, JobReport, Scheduler, SkipReason};
use walksched_http::HttpServer;
use walksched_notify::{HttpPushTransport, MockTransport};
use walksched_store::{
    AuditEventType, SqliteStore, Store, UserRecord, WalkRecord, collections, fields,
};
use walksched_util::WalkId;

type Pushes = Arc<Mutex<Vec<Value>>>;

fn fast_config() -> ScheduleConfig {
    ScheduleConfig {
        grace_period: Duration::from_secs(2),
        late_request_lead: Duration::from_millis(200),
    }
}

async fn seed_walk(store: &dyn Store, status: WalkStatus) {
    let walk = WalkRecord::new("W1", status, "alice", "bob");
    store
        .put(collections::WALKS, "W1", walk.to_document().unwrap())
        .await
        .unwrap();
    for id in ["alice", "bob"] {
        let user = UserRecord::new(id).with_push_token(format!("tok-{}", id));
        store
            .put(collections::USERS, id, user.to_document().unwrap())
            .await
            .unwrap();
    }
}

async fn read_walk(store: &dyn Store) -> WalkRecord {
    let doc = store.get(collections::WALKS, "W1").await.unwrap().unwrap();
    WalkRecord::from_document(&WalkId::new("W1"), &doc).unwrap()
}

async fn next_report(reports: &mut broadcast::Receiver<JobReport>) -> JobReport {
    tokio::time::timeout(Duration::from_secs(10), reports.recv())
        .await
        .expect("job should fire")
        .unwrap()
}

async fn start_gateway() -> (String, Pushes) {
    async fn receive(State(pushes): State<Pushes>, Json(body): Json<Value>) -> Json<Value> {
        pushes.lock().unwrap().push(body);
        Json(json!({"message_id": "gw-1"}))
    }

    let pushes: Pushes = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/push", post(receive))
        .with_state(pushes.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}/push", addr), pushes)
}

/// Running service on an ephemeral port
struct TestService {
    base_url: String,
    scheduler: Arc<Scheduler>,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestService {
    async fn start(scheduler: Arc<Scheduler>) -> Self {
        let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), scheduler.clone())
            .await
            .unwrap();
        let base_url = format!("http://{}", server.local_addr().unwrap());

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            server
                .run(async move {
                    let _ = stop_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            base_url,
            scheduler,
            stop: Some(stop_tx),
            handle,
        }
    }

    async fn stop(mut self) -> usize {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = self.handle.await;
        self.scheduler.shutdown().await
    }
}

#[tokio::test]
async fn test_schedule_activate_then_skip_expiry() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed_walk(store.as_ref(), WalkStatus::Accepted).await;

    let (endpoint, pushes) = start_gateway().await;
    let transport =
        HttpPushTransport::new(endpoint, Some("key".into()), Duration::from_secs(5)).unwrap();
    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        Arc::new(transport),
        fast_config(),
    ));
    let mut reports = scheduler.subscribe();
    let service = TestService::start(scheduler.clone()).await;

    let scheduled_at = Utc::now() + chrono::Duration::milliseconds(500);
    let response = reqwest::Client::new()
        .post(format!("{}/schedule", service.base_url))
        .json(&json!({
            "walkId": "W1",
            "initiatorId": "alice",
            "counterpartyId": "bob",
            "scheduledAt": scheduled_at.to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["activationInstant"].is_string());
    assert!(body["timeoutInstant"].is_string());

    let activation = next_report(&mut reports).await;
    assert_eq!(activation.kind, JobKind::Activation);
    assert_eq!(activation.outcome, JobOutcome::Applied { notified: 2 });

    let walk = read_walk(store.as_ref()).await;
    assert!(walk.activation_applied);
    assert_eq!(walk.status, WalkStatus::Accepted);

    {
        let pushes = pushes.lock().unwrap();
        assert_eq!(pushes.len(), 2);
        assert_eq!(pushes[0]["data"]["type"], "walk_started");
        assert_eq!(pushes[0]["data"]["walk_id"], "W1");
    }

    // Activated but never started: the timeout leaves it alone
    let timeout = next_report(&mut reports).await;
    assert_eq!(timeout.kind, JobKind::Timeout);
    assert_eq!(timeout.outcome, JobOutcome::Skipped(SkipReason::AlreadyActivated));
    assert_eq!(read_walk(store.as_ref()).await.status, WalkStatus::Accepted);

    assert_eq!(service.stop().await, 0);
}

#[tokio::test]
async fn test_unactivated_walk_expires() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    seed_walk(store.as_ref(), WalkStatus::Requested).await;

    let transport = MockTransport::new();
    let scheduler = Arc::new(Scheduler::new(
        store.clone(),
        Arc::new(transport.clone()),
        fast_config(),
    ));
    let mut reports = scheduler.subscribe();

    // Requested instant in the past: clamped to now + lead
    let now = Utc::now();
    let request = walksched_api::ScheduleRequest::new(
        "W1",
        "alice",
        "bob",
        (now - chrono::Duration::minutes(10)).to_rfc3339(),
    );
    let outcome = scheduler.schedule_walk(&request, now).await.unwrap();
    assert!(outcome.clamped);

    // Not yet accepted when the activation fires
    let activation = next_report(&mut reports).await;
    assert_eq!(
        activation.outcome,
        JobOutcome::Skipped(SkipReason::NotAccepted(WalkStatus::Requested))
    );

    // Accepted afterwards, but nobody activated it in time
    let mut walk = read_walk(store.as_ref()).await;
    walk.status = WalkStatus::Accepted;
    store
        .put(collections::WALKS, "W1", walk.to_document().unwrap())
        .await
        .unwrap();
    let mut alice = UserRecord::new("alice").with_push_token("tok-alice");
    alice.active_walk_id = Some(WalkId::new("W1"));
    store
        .put(collections::USERS, "alice", alice.to_document().unwrap())
        .await
        .unwrap();

    let timeout = next_report(&mut reports).await;
    assert_eq!(timeout.outcome, JobOutcome::Applied { notified: 2 });

    let walk = read_walk(store.as_ref()).await;
    assert_eq!(walk.status, WalkStatus::Expired);
    let alice_doc = store.get(collections::USERS, "alice").await.unwrap().unwrap();
    assert!(!alice_doc.contains_key(fields::ACTIVE_WALK_ID));

    let audits = store.recent_audits(10).await.unwrap();
    assert!(audits.iter().any(|a| matches!(
        &a.event,
        AuditEventType::WalkExpired { walk_id, .. } if walk_id.as_str() == "W1"
    )));
    assert_eq!(scheduler.live_walks(), 0);
}

#[tokio::test]
async fn test_reschedule_over_http() {
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let scheduler = Arc::new(Scheduler::new(
        store,
        Arc::new(MockTransport::new()),
        ScheduleConfig::default(),
    ));
    let service = TestService::start(scheduler.clone()).await;
    let client = reqwest::Client::new();

    let mut job_ids = Vec::new();
    for hours in [1, 2] {
        let at = Utc::now() + chrono::Duration::hours(hours);
        let response = client
            .post(format!("{}/schedule", service.base_url))
            .json(&json!({
                "walkId": "W1",
                "initiatorId": "alice",
                "counterpartyId": "bob",
                "scheduledAt": at.to_rfc3339(),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let view: Value = client
            .get(format!("{}/jobs/W1", service.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        job_ids.push(view["activation"]["jobId"].clone());
    }

    assert_ne!(job_ids[0], job_ids[1]);
    assert_eq!(scheduler.live_walks(), 1);
    assert_eq!(scheduler.registry().pending_jobs(), 2);

    let bad = client
        .post(format!("{}/schedule", service.base_url))
        .json(&json!({"walkId": "W2"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);

    let health: Value = client
        .get(format!("{}/health", service.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["liveWalks"], 1);

    // Pending jobs are dropped at shutdown
    assert_eq!(service.stop().await, 1);
}

#[test]
fn test_config_file_drives_schedule_windows() {
    let config = parse_config(
        r#"
        config_version = 1

        [service]
        listen_addr = "127.0.0.1:0"

        [schedule]
        grace_period_seconds = 120
        late_request_lead_seconds = 30
        "#,
    )
    .unwrap();

    assert_eq!(config.schedule.grace_period, Duration::from_secs(120));
    assert_eq!(config.schedule.late_request_lead, Duration::from_secs(30));
    assert!(config.push.is_none());
}

#[tokio::test]
async fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("walksched.db");

    {
        let store = SqliteStore::open(&db_path).unwrap();
        seed_walk(&store, WalkStatus::Accepted).await;
        store
            .append_audit(walksched_store::AuditEvent::new(AuditEventType::ServiceStarted))
            .await
            .unwrap();
    }

    let store = SqliteStore::open(&db_path).unwrap();
    assert_eq!(read_walk(&store).await.status, WalkStatus::Accepted);
    let audits = store.recent_audits(5).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].event, AuditEventType::ServiceStarted);
}
