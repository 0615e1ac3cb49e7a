//! SQLite SQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - No boolean type; booleans are stored as 1/0
//! - Positional `?` placeholders
//! - LIMIT ... OFFSET ... pagination

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }
}
