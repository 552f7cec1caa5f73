//! End-to-end tests of `POST /api/ask` over a loaded store.

use std::sync::Arc;

use axum::http::StatusCode;
use data_agent::config::LlmConfig;
use data_agent::db;
use data_agent::llm::LlmProvider;
use data_agent::proposer::{self, FixedProposer, ProposerKind, DEMO_SQL};
use data_agent::query::AskService;
use data_agent::safety::SafetyGate;
use data_agent::server::build_router;
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{ask, TestStore};

#[tokio::test]
async fn test_demo_question_returns_revenue_per_region() {
    let store = TestStore::with_sales().await;
    let router = store.router(Arc::new(FixedProposer::new())).await;

    let (status, body) = ask(router, "What is the revenue by region?").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sql"], DEMO_SQL);
    assert_eq!(body["columns"], json!(["region", "revenue"]));

    let mut rows = body["rows"].as_array().unwrap().clone();
    rows.sort_by_key(|row| row["region"].as_str().unwrap().to_string());
    assert_eq!(
        rows,
        vec![
            json!({"region": "north", "revenue": 25.5}),
            json!({"region": "south", "revenue": 10.0}),
        ]
    );
}

#[tokio::test]
async fn test_missing_table_is_400_naming_it() {
    let store = TestStore::with_sales().await;
    let router = store
        .router(Arc::new(FixedProposer::with_statement("SELECT * FROM orders", "")))
        .await;

    let (status, body) = ask(router, "show orders").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("SQL execution failed"), "{detail}");
    assert!(detail.contains("orders"), "{detail}");
}

#[tokio::test]
async fn test_destructive_statement_leaves_store_untouched() {
    let store = TestStore::with_sales().await;
    let router = store
        .router(Arc::new(FixedProposer::with_statement("DROP TABLE sales", "")))
        .await;

    let (status, body) = ask(router, "drop it").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"detail": "Destructive SQL is not allowed."}));

    let result = store
        .client()
        .await
        .execute_query("SELECT COUNT(*) AS n FROM sales")
        .await
        .unwrap();
    assert_eq!(result.rows_as_json(), vec![json!({"n": 3}).as_object().unwrap().clone()]);
}

#[tokio::test]
async fn test_read_only_store_refuses_keyword_free_writes() {
    let store = TestStore::with_sales().await;
    let router = store
        .router(Arc::new(FixedProposer::with_statement(
            "CREATE TABLE notes (body TEXT)",
            "",
        )))
        .await;

    let (status, body) = ask(router, "make a notes table").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("readonly"));
}

#[tokio::test]
async fn test_empty_result_keeps_columns() {
    let store = TestStore::with_sales().await;
    let router = store
        .router(Arc::new(FixedProposer::with_statement(
            "SELECT region, quantity FROM sales WHERE quantity > 100",
            "",
        )))
        .await;

    let (status, body) = ask(router, "big orders").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["columns"], json!(["region", "quantity"]));
    assert_eq!(body["rows"], json!([]));
    assert_eq!(body["summary"], "Returned 0 row(s).");
}

#[tokio::test]
async fn test_llm_proposer_end_to_end() {
    let store = TestStore::with_sales().await;
    let llm = LlmConfig {
        provider: LlmProvider::Mock,
        ..LlmConfig::default()
    };
    let proposer = proposer::build(ProposerKind::Llm, &llm, None).unwrap();
    let router = store.router(proposer).await;

    let (status, body) = ask(router, "How many sales are there?").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], json!([{"count": 3}]));
}

#[tokio::test]
async fn test_store_not_loaded_yet_is_503() {
    let store = TestStore::empty();
    let service = AskService::new(
        db::connect(&store.config).unwrap(),
        Arc::new(FixedProposer::new()),
        SafetyGate::default(),
    );
    let router = build_router(Arc::new(service), &[]);

    let (status, body) = ask(router, "What is the revenue by region?").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["detail"].as_str().unwrap().starts_with("Store unavailable"));
}
