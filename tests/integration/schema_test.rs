//! Schema introspection integration tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use data_agent::db::{DatabaseClient, SqliteClient};
use data_agent::proposer::FixedProposer;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use super::{send, TestStore};

#[tokio::test]
async fn test_introspection_excludes_internal_tables() {
    let store = TestStore::with_sales().await;

    // AUTOINCREMENT and ANALYZE make SQLite create sqlite_sequence and sqlite_stat1
    let writer = SqliteClient::connect(&store.config.writable()).await.unwrap();
    writer
        .execute_query("CREATE TABLE events (id INTEGER PRIMARY KEY AUTOINCREMENT, kind TEXT)")
        .await
        .unwrap();
    writer
        .execute_query("INSERT INTO events (kind) VALUES ('load')")
        .await
        .unwrap();
    writer.execute_query("ANALYZE").await.unwrap();
    writer.close().await.unwrap();

    let schema = store.client().await.introspect_schema().await.unwrap();
    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names, vec!["events", "sales"]);
}

#[tokio::test]
async fn test_schema_endpoint_lists_loaded_tables() {
    let store = TestStore::with_sales().await;
    store.load("regions", "region,manager\nnorth,kim\n").await;
    let router = store.router(Arc::new(FixedProposer::new())).await;

    let request = Request::get("/api/schema").body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"table": "regions", "columns": ["region", "manager"]},
            {"table": "sales", "columns": ["region", "quantity", "unit_price"]},
        ])
    );
}
