//! MySQL driver built on mysql_async's text protocol.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{OptsBuilder, Pool, Row, Value};

use super::{
    quote_mysql_ident, status_result, ColumnRef, Db, QueryResult, SortOrder, TableRef, NULL_MARKER,
};
use crate::config::ConnectionConfig;
use crate::util::format_mysql_error;

pub struct MysqlDb {
    pool: Pool,
}

impl MysqlDb {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let port: u16 = config
            .effective_port()
            .parse()
            .with_context(|| format!("invalid port: {}", config.effective_port()))?;

        let mut opts = OptsBuilder::default()
            .ip_or_hostname(config.effective_host().to_string())
            .tcp_port(port)
            .user(Some(config.effective_user().to_string()));
        if !config.password.is_empty() {
            opts = opts.pass(Some(config.password.clone()));
        }
        if !config.database.is_empty() {
            opts = opts.db_name(Some(config.database.clone()));
        }

        let pool = Pool::new(opts);

        // Fail fast on bad credentials instead of at the first query.
        let mut conn = pool
            .get_conn()
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))?;
        conn.ping()
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))?;

        Ok(Self { pool })
    }

    async fn run(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self
            .pool
            .get_conn()
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))?;

        let mut result = conn
            .query_iter(sql)
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))?;

        let columns: Vec<String> = result
            .columns()
            .map(|cols| cols.iter().map(|c| c.name_str().into_owned()).collect())
            .unwrap_or_default();

        if columns.is_empty() {
            let affected = result.affected_rows();
            return Ok(status_result(affected));
        }

        let raw: Vec<Row> = result
            .collect()
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))?;

        let rows = raw
            .into_iter()
            .map(|row| row.unwrap().into_iter().map(value_to_string).collect())
            .collect();

        Ok(QueryResult { columns, rows })
    }
}

#[async_trait]
impl Db for MysqlDb {
    async fn list_tables(&self) -> Result<Vec<TableRef>> {
        // Scoped to the connected database when there is one; system schemas
        // are skipped otherwise.
        let result = self
            .run(
                "SELECT table_schema, table_name \
                 FROM information_schema.tables \
                 WHERE (DATABASE() IS NOT NULL AND table_schema = DATABASE()) \
                    OR (DATABASE() IS NULL AND table_schema NOT IN \
                        ('information_schema', 'mysql', 'performance_schema', 'sys')) \
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
                 WHERE (DATABASE() IS NOT NULL AND table_schema = DATABASE()) \
                    OR (DATABASE() IS NULL AND table_schema NOT IN \
                        ('information_schema', 'mysql', 'performance_schema', 'sys')) \
                 ORDER BY table_name, ordinal_position",
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
            quote_mysql_ident(schema),
            quote_mysql_ident(table)
        );
        if let Some(sort) = sort {
            let direction = if sort.descending { "DESC" } else { "ASC" };
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_mysql_ident(&sort.column),
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
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| anyhow!(format_mysql_error(&e)))
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::NULL => NULL_MARKER.to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Date(year, month, day, hour, minute, second, micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if negative { "-" } else { "" };
            format!("{sign}{days:03} {hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_renders_as_marker() {
        assert_eq!(value_to_string(Value::NULL), "NULL");
    }

    #[test]
    fn scalar_values_render_as_text() {
        assert_eq!(value_to_string(Value::Bytes(b"hello".to_vec())), "hello");
        assert_eq!(value_to_string(Value::Int(-8)), "-8");
        assert_eq!(value_to_string(Value::UInt(8)), "8");
        assert_eq!(value_to_string(Value::Double(1.5)), "1.5");
    }

    #[test]
    fn temporal_values_render_as_text() {
        assert_eq!(
            value_to_string(Value::Date(2024, 6, 1, 12, 30, 5, 0)),
            "2024-06-01 12:30:05.000000"
        );
        assert_eq!(
            value_to_string(Value::Time(true, 1, 2, 3, 4, 5)),
            "-001 02:03:04.000005"
        );
    }
}
