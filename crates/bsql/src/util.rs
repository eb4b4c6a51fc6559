use std::error::Error as StdError;

/// Format a postgres error with the server's own message when available,
/// falling back to the source chain.
pub fn format_pg_error(e: &tokio_postgres::Error) -> String {
    if let Some(db_err) = e.as_db_error() {
        return db_err.to_string();
    }
    if let Some(source) = e.source() {
        return format!("{}: {}", e, source);
    }
    e.to_string()
}

/// Format a mysql error, surfacing server errors with their code and state.
pub fn format_mysql_error(e: &mysql_async::Error) -> String {
    match e {
        mysql_async::Error::Server(err) => {
            format!("ERROR {} ({}): {}", err.code, err.state, err.message)
        }
        other => other.to_string(),
    }
}
