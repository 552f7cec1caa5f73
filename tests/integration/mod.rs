//! Shared fixtures for the integration tests.

pub mod ask_test;
pub mod loader_test;
pub mod schema_test;

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use data_agent::config::StoreConfig;
use data_agent::db::{DatabaseClient, SqliteClient};
use data_agent::loader::load_csv;
use data_agent::proposer::StatementProposer;
use data_agent::query::AskService;
use data_agent::safety::SafetyGate;
use data_agent::server::build_router;
use tempfile::TempDir;
use tower::ServiceExt;

pub const SALES_CSV: &str = "\
region,quantity,unit_price
north,2,10.0
north,1,5.5
south,4,2.5
";

/// A store file inside a temporary directory.
pub struct TestStore {
    pub dir: TempDir,
    pub config: StoreConfig,
}

impl TestStore {
    /// Creates an empty (not yet existing) store.
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig::from_url(format!("sqlite:{}", dir.path().join("data.db").display()));
        Self { dir, config }
    }

    /// Creates a store with `sales` loaded from [`SALES_CSV`].
    pub async fn with_sales() -> Self {
        let store = Self::empty();
        store.load("sales", SALES_CSV).await;
        store
    }

    /// Writes `contents` to a CSV file in the store directory.
    pub fn write_csv(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Loads CSV text into `table`.
    pub async fn load(&self, table: &str, contents: &str) {
        let path = self.write_csv(&format!("{table}.csv"), contents);
        load_csv(&path, table, &self.config).await.unwrap();
    }

    /// Opens a read-only client, as the server does.
    pub async fn client(&self) -> Arc<dyn DatabaseClient> {
        Arc::new(SqliteClient::connect(&self.config).await.unwrap())
    }

    /// Builds the HTTP router over this store.
    pub async fn router(&self, proposer: Arc<dyn StatementProposer>) -> Router {
        let service = AskService::new(self.client().await, proposer, SafetyGate::default());
        build_router(Arc::new(service), &[])
    }
}

/// Posts a question and returns the status and JSON body.
pub async fn ask(router: Router, question: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/ask")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "query": question }).to_string()))
        .unwrap();
    send(router, request).await
}

/// Sends a request and returns the status and JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
