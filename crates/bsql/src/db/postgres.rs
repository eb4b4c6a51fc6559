//! Postgres driver built on tokio-postgres' simple-query protocol, which
//! delivers every cell as text and so needs no per-type decoding.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use super::{
    quote_postgres_ident, status_result, ColumnRef, Db, QueryResult, SortOrder, TableRef,
    NULL_MARKER,
};
use crate::config::ConnectionConfig;
use crate::util::format_pg_error;

pub struct PostgresDb {
    client: Client,
    /// Task driving the wire connection; aborted on close.
    conn_task: JoinHandle<()>,
}

impl PostgresDb {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let port: u16 = config
            .effective_port()
            .parse()
            .with_context(|| format!("invalid port: {}", config.effective_port()))?;

        let mut pg = tokio_postgres::Config::new();
        pg.host(config.effective_host())
            .port(port)
            .user(config.effective_user())
            .dbname(config.effective_database());
        if !config.password.is_empty() {
            pg.password(&config.password);
        }

        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| anyhow!(format_pg_error(&e)))?;

        let conn_task = tokio::spawn(async move {
            let _ = connection.await;
        });

        Ok(Self { client, conn_task })
    }

    async fn run(&self, sql: &str) -> Result<QueryResult> {
        let messages = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| anyhow!(format_pg_error(&e)))?;
        Ok(collect_result(messages))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn list_tables(&self) -> Result<Vec<TableRef>> {
        let result = self
            .run(
                "SELECT table_schema, table_name \
                 FROM information_schema.tables \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY table_schema, table_name",
            )
            .await?;

        Ok(result
            .rows
            .into_iter()
            .map(|mut row| TableRef {
                name: row.pop().unwrap_or_default(),
                schema: row.pop().unwrap_or_default(),
            })
            .collect())
    }

    async fn list_columns(&self) -> Result<Vec<ColumnRef>> {
        let result = self
            .run(
                "SELECT table_schema, table_name, column_name \
                 FROM information_schema.columns \
                 WHERE table_schema NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY table_schema, table_name, ordinal_position",
            )
            .await?;

        Ok(result
            .rows
            .into_iter()
            .map(|mut row| ColumnRef {
                name: row.pop().unwrap_or_default(),
                table: row.pop().unwrap_or_default(),
                schema: row.pop().unwrap_or_default(),
            })
            .collect())
    }

    async fn fetch_table_data(
        &self,
        schema: &str,
        table: &str,
        limit: usize,
        offset: usize,
        sort: Option<&SortOrder>,
    ) -> Result<QueryResult> {
        let mut sql = format!(
            "SELECT * FROM {}.{}",
            quote_postgres_ident(schema),
            quote_postgres_ident(table)
        );
        if let Some(sort) = sort {
            let direction = if sort.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_postgres_ident(&sort.column),
                direction
            ));
        }
        sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

        self.run(&sql).await
    }

    async fn exec_query(&self, sql: &str) -> Result<QueryResult> {
        self.run(sql).await
    }

    async fn close(&self) -> Result<()> {
        self.conn_task.abort();
        Ok(())
    }
}

/// Fold a simple-query message stream into a result set. When the statement
/// yields more than one set the last wins; statements with no set at all
/// become a one-cell status grid.
fn collect_result(messages: Vec<SimpleQueryMessage>) -> QueryResult {
    let mut current_columns: Option<Vec<String>> = None;
    let mut current_rows: Vec<Vec<String>> = Vec::new();
    let mut last: Option<QueryResult> = None;
    let mut affected: u64 = 0;

    for msg in messages {
        match msg {
            SimpleQueryMessage::RowDescription(desc) => {
                current_columns = Some(desc.iter().map(|c| c.name().to_string()).collect());
                current_rows.clear();
            }
            SimpleQueryMessage::Row(row) => {
                if current_columns.is_none() {
                    current_columns =
                        Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                let mut cells = Vec::with_capacity(row.len());
                for i in 0..row.len() {
                    cells.push(row.get(i).unwrap_or(NULL_MARKER).to_string());
                }
                current_rows.push(cells);
            }
            SimpleQueryMessage::CommandComplete(n) => {
                affected = n;
                if let Some(columns) = current_columns.take() {
                    last = Some(QueryResult {
                        columns,
                        rows: std::mem::take(&mut current_rows),
                    });
                }
            }
            _ => {}
        }
    }

    if let Some(columns) = current_columns.take() {
        last = Some(QueryResult {
            columns,
            rows: current_rows,
        });
    }

    last.unwrap_or_else(|| status_result(affected))
}
