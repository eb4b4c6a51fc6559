//! Integration tests against a live PostgreSQL database.

mod common;

use bsql::db::{self, SortOrder};
use common::{test_config, unique_table};

#[tokio::test]
async fn connect_and_run_simple_query() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let result = db.exec_query("SELECT 1 AS value").await.unwrap();

    assert_eq!(result.columns, vec!["value"]);
    assert_eq!(result.rows, vec![vec!["1".to_string()]]);

    db.close().await.unwrap();
}

#[tokio::test]
async fn null_cells_render_as_marker() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let result = db.exec_query("SELECT NULL AS nothing").await.unwrap();
    assert_eq!(result.rows, vec![vec!["NULL".to_string()]]);

    db.close().await.unwrap();
}

#[tokio::test]
async fn created_tables_show_up_in_listing() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let table = unique_table("list");

    db.exec_query(&format!("CREATE TABLE {table} (id INT)"))
        .await
        .unwrap();

    let tables = db.list_tables().await.unwrap();
    assert!(
        tables.iter().any(|t| t.name == table),
        "{table} missing from listing"
    );

    db.exec_query(&format!("DROP TABLE {table}")).await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn columns_are_listed_in_position_order() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let table = unique_table("cols");

    db.exec_query(&format!(
        "CREATE TABLE {table} (zeta INT, alpha TEXT, mid BOOLEAN)"
    ))
    .await
    .unwrap();

    let columns: Vec<String> = db
        .list_columns()
        .await
        .unwrap()
        .into_iter()
        .filter(|c| c.table == table)
        .map(|c| c.name)
        .collect();
    // Catalog position order, not alphabetical.
    assert_eq!(columns, vec!["zeta", "alpha", "mid"]);

    db.exec_query(&format!("DROP TABLE {table}")).await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn table_pages_respect_limit_offset_and_sort() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let table = unique_table("page");

    db.exec_query(&format!("CREATE TABLE {table} (id INT, name TEXT)"))
        .await
        .unwrap();
    db.exec_query(&format!(
        "INSERT INTO {table} VALUES (1, 'a'), (2, 'b'), (3, 'c')"
    ))
    .await
    .unwrap();

    let page = db
        .fetch_table_data("public", &table, 2, 0, None)
        .await
        .unwrap();
    assert_eq!(page.columns, vec!["id", "name"]);
    assert_eq!(page.rows.len(), 2);

    // Paging past the end yields an empty result, not an error.
    let past_end = db
        .fetch_table_data("public", &table, 2, 10, None)
        .await
        .unwrap();
    assert!(past_end.rows.is_empty());

    let sort = SortOrder {
        column: "id".to_string(),
        descending: true,
    };
    let sorted = db
        .fetch_table_data("public", &table, 3, 0, Some(&sort))
        .await
        .unwrap();
    assert_eq!(sorted.rows[0][0], "3");

    db.exec_query(&format!("DROP TABLE {table}")).await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn reserved_word_identifiers_are_quoted() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let table = unique_table("quoted");

    // A column named like a keyword only works if fetches quote it.
    db.exec_query(&format!("CREATE TABLE {table} (\"order\" INT)"))
        .await
        .unwrap();
    db.exec_query(&format!("INSERT INTO {table} VALUES (7)"))
        .await
        .unwrap();

    let sort = SortOrder {
        column: "order".to_string(),
        descending: false,
    };
    let page = db
        .fetch_table_data("public", &table, 10, 0, Some(&sort))
        .await
        .unwrap();
    assert_eq!(page.rows, vec![vec!["7".to_string()]]);

    db.exec_query(&format!("DROP TABLE {table}")).await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn query_errors_carry_the_server_message() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let err = db
        .exec_query("SELECT * FROM bsql_no_such_table_xyz")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(
        message.contains("bsql_no_such_table_xyz") || message.contains("does not exist"),
        "unhelpful error message: {message}"
    );

    db.close().await.unwrap();
}

#[tokio::test]
async fn statements_without_rows_yield_a_status_result() {
    let Some(config) = test_config() else {
        eprintln!("Skipping: BSQL_TEST_DATABASE not set");
        return;
    };

    let db = db::connect(&config).await.unwrap();
    let table = unique_table("status");

    let created = db
        .exec_query(&format!("CREATE TABLE {table} (id INT)"))
        .await
        .unwrap();
    assert_eq!(created.columns, vec!["status"]);

    let inserted = db
        .exec_query(&format!("INSERT INTO {table} VALUES (1), (2)"))
        .await
        .unwrap();
    assert_eq!(inserted.columns, vec!["status"]);
    assert_eq!(inserted.rows, vec![vec!["2 rows affected".to_string()]]);

    db.exec_query(&format!("DROP TABLE {table}")).await.unwrap();
    db.close().await.unwrap();
}

#[tokio::test]
async fn connect_failure_reports_an_error() {
    let config = bsql::config::ConnectionConfig {
        host: "invalid-host-that-does-not-exist".to_string(),
        port: "5432".to_string(),
        ..Default::default()
    };
    assert!(db::connect(&config).await.is_err());
}
