//! CSV loader tests against a real store file.

use data_agent::db::Value;
use data_agent::error::AgentError;
use data_agent::loader::{load_csv, ColumnKind};
use pretty_assertions::assert_eq;

use super::{TestStore, SALES_CSV};

#[tokio::test]
async fn test_load_reports_inferred_columns() {
    let store = TestStore::empty();
    let path = store.write_csv("sales.csv", SALES_CSV);

    let summary = load_csv(&path, "sales", &store.config).await.unwrap();

    assert_eq!(summary.rows, 3);
    let kinds: Vec<(String, ColumnKind)> = summary
        .columns
        .into_iter()
        .map(|c| (c.name, c.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("region".to_string(), ColumnKind::Text),
            ("quantity".to_string(), ColumnKind::Integer),
            ("unit_price".to_string(), ColumnKind::Real),
        ]
    );
}

#[tokio::test]
async fn test_loading_twice_keeps_last_file() {
    let store = TestStore::with_sales().await;
    store.load("sales", "region,quantity,unit_price\nwest,7,1.0\n").await;

    let result = store
        .client()
        .await
        .execute_query("SELECT region, quantity FROM sales")
        .await
        .unwrap();

    assert_eq!(result.rows, vec![vec![Value::from("west"), Value::Int(7)]]);
}

#[tokio::test]
async fn test_malformed_csv_keeps_previous_table() {
    let store = TestStore::with_sales().await;
    let bad = store.write_csv("bad.csv", "region,quantity\nnorth,1\nsouth\n");

    let err = load_csv(&bad, "sales", &store.config).await.unwrap_err();
    assert!(matches!(err, AgentError::Load(_)));

    let result = store
        .client()
        .await
        .execute_query("SELECT COUNT(*) FROM sales")
        .await
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Int(3)]]);
}

#[tokio::test]
async fn test_normalized_headers_reach_the_store() {
    let store = TestStore::empty();
    store.load("people", "name,,Name\nada,1,x\n").await;

    let schema = store.client().await.introspect_schema().await.unwrap();
    let people = schema.table("people").unwrap();
    let names: Vec<&str> = people.columns.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["name", "Unnamed: 1", "Name.1"]);
}
