//! Dialect-specific identifier quoting.

/// Double-quote an identifier for postgres, escaping embedded quotes.
pub fn quote_postgres_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Backtick-quote an identifier for mysql, escaping embedded backticks.
pub fn quote_mysql_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
