//! Database access layer.
//!
//! Everything the UI knows about a live database goes through the [`Db`]
//! capability trait; the concrete driver is picked at connect time from the
//! descriptor's [`Driver`] tag. All cell values cross this boundary as text,
//! with SQL NULL rendered as the literal marker `"NULL"`.

mod ident;
mod mysql;
mod postgres;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ConnectionConfig;

pub use ident::{quote_mysql_ident, quote_postgres_ident};

/// How SQL NULL is rendered in result cells.
pub const NULL_MARKER: &str = "NULL";

/// Supported database backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Postgres,
    Mysql,
}

impl Driver {
    pub fn as_str(self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::Mysql => "mysql",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Driver::Postgres => "PostgreSQL",
            Driver::Mysql => "MySQL",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Driver::Postgres => "🐘",
            Driver::Mysql => "🐬",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Driver::Postgres => Driver::Mysql,
            Driver::Mysql => Driver::Postgres,
        }
    }

    pub fn default_port(self) -> &'static str {
        match self {
            Driver::Postgres => "5432",
            Driver::Mysql => "3306",
        }
    }

    pub fn default_user(self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::Mysql => "root",
        }
    }

    /// Database used when the descriptor leaves the field empty. MySQL has no
    /// equivalent of the postgres maintenance database, so it stays empty and
    /// the server decides.
    pub fn default_database(self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::Mysql => "",
        }
    }

    /// Dialect identifier quoting, tolerant of reserved words and mixed case.
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Driver::Postgres => quote_postgres_ident(ident),
            Driver::Mysql => quote_mysql_ident(ident),
        }
    }
}

/// A browsable relation, identified by (schema, name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// One column of one relation, in catalog position order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub name: String,
}

/// A fully-materialized, text-rendered result set. Immutable once produced;
/// superseded wholesale by the next fetch or execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Explicit ordering for table browsing, ascending unless `descending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub column: String,
    pub descending: bool,
}

/// Capability interface over a live connection. One instance per session,
/// shared as `Arc<dyn Db>` between the UI and spawned commands.
#[async_trait]
pub trait Db: Send + Sync {
    /// All user relations, ordered by (schema, name).
    async fn list_tables(&self) -> Result<Vec<TableRef>>;

    /// All columns of all user relations, ordered by catalog position within
    /// each table. Loaded once per editor session to feed completion.
    async fn list_columns(&self) -> Result<Vec<ColumnRef>>;

    /// One page of a table in natural or explicitly sorted order.
    async fn fetch_table_data(
        &self,
        schema: &str,
        table: &str,
        limit: usize,
        offset: usize,
        sort: Option<&SortOrder>,
    ) -> Result<QueryResult>;

    /// Run one ad-hoc statement. Statements that produce no result set yield
    /// a one-cell `status` grid with the affected-row count.
    async fn exec_query(&self, sql: &str) -> Result<QueryResult>;

    /// Tear down the connection. Idempotent; errors are reportable but the
    /// handle is unusable either way.
    async fn close(&self) -> Result<()>;
}

/// Result stand-in for statements that return no rows (DDL/DML).
pub(crate) fn status_result(affected: u64) -> QueryResult {
    QueryResult {
        columns: vec!["status".to_string()],
        rows: vec![vec![format!("{affected} rows affected")]],
    }
}

/// Connect with the driver named in the descriptor.
pub async fn connect(config: &ConnectionConfig) -> Result<Arc<dyn Db>> {
    match config.driver {
        Driver::Postgres => Ok(Arc::new(postgres::PostgresDb::connect(config).await?)),
        Driver::Mysql => Ok(Arc::new(mysql::MysqlDb::connect(config).await?)),
    }
}
