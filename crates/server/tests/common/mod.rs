//! Common test utilities for API testing with mocks.
//!
//! Builds an in-process router over a real SQLite store and a mock stats
//! feed, so handlers run end to end without network access.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use rinkwatch_core::{
    create_audit_system, AuditFilter, AuditStore, Config, DatabaseConfig, FeedOrchestrator,
    OrchestratorConfig, SqliteAuditStore, SqliteGameStore,
    testing::MockFeedClient,
};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use rinkwatch_core::testing::fixtures;

/// Test fixture for API testing with a mock feed.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock feed - configure schedules, boxscores and seasons
    pub feed: Arc<MockFeedClient>,
    /// Game store backing the API, for seeding and inspection
    pub store: Arc<SqliteGameStore>,
    /// Audit store, for inspecting emitted events
    pub audit_store: Arc<SqliteAuditStore>,
    /// Orchestrator behind the job endpoints (not started)
    pub orchestrator: Arc<FeedOrchestrator>,
    /// Temporary directory for test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[allow(dead_code)]
impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let feed = Arc::new(MockFeedClient::new());

        // Timers never fire during a test; cycles are driven by hand
        let orchestrator_config = OrchestratorConfig {
            monitor_interval_ms: 3_600_000,
            ingest_interval_ms: 3_600_000,
            ..Default::default()
        };

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            orchestrator: orchestrator_config.clone(),
            ..Default::default()
        };

        let store =
            Arc::new(SqliteGameStore::new(&db_path).expect("Failed to create game store"));
        let audit_store =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));

        let (audit_handle, audit_writer) =
            create_audit_system(Arc::clone(&audit_store) as Arc<dyn AuditStore>, 100);
        tokio::spawn(audit_writer.run());

        let orchestrator = Arc::new(FeedOrchestrator::new(
            orchestrator_config,
            feed.clone(),
            store.clone(),
            Some(audit_handle),
        ));

        let state = Arc::new(rinkwatch_server::state::AppState::new(
            config,
            audit_store.clone(),
            store.clone(),
            Arc::clone(&orchestrator),
        ));

        let router = rinkwatch_server::api::create_router(state);

        Self {
            router,
            feed,
            store,
            audit_store,
            orchestrator,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Poll the audit log until an event of `event_type` shows up.
    pub async fn wait_for_audit(&self, event_type: &str) -> bool {
        let filter = AuditFilter::new().with_event_type(event_type);
        for _ in 0..50 {
            if self.audit_store.count(&filter).unwrap_or(0) > 0 {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
