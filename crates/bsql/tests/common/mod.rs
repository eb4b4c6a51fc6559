//! Shared helpers for live-database integration tests.
//!
//! Tests are skipped unless `BSQL_TEST_DATABASE` is set (a `.env` file is
//! honored). The target database needs a user allowed to create and drop
//! tables; every test works on uniquely-named tables so runs don't collide.

use std::sync::atomic::{AtomicUsize, Ordering};

use bsql::config::ConnectionConfig;
use bsql::db::Driver;

static TABLE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Connection descriptor for the test database, or `None` to skip.
pub fn test_config() -> Option<ConnectionConfig> {
    dotenvy::dotenv().ok();
    let database = std::env::var("BSQL_TEST_DATABASE").ok()?;

    Some(ConnectionConfig {
        driver: Driver::Postgres,
        host: std::env::var("BSQL_TEST_HOST").unwrap_or_default(),
        port: std::env::var("BSQL_TEST_PORT").unwrap_or_default(),
        user: std::env::var("BSQL_TEST_USER").unwrap_or_default(),
        password: std::env::var("BSQL_TEST_PASSWORD").unwrap_or_default(),
        database,
        ..Default::default()
    })
}

/// A table name unique to this process and test.
pub fn unique_table(prefix: &str) -> String {
    let id = TABLE_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("bsql_test_{}_{}_{}", prefix, std::process::id(), id)
}
