//! PostgreSQL SQL dialect.
//!
//! PostgreSQL features used here:
//! - ANSI identifier quoting (`"`)
//! - Native boolean type (true/false)
//! - Numbered bind placeholders (`$1`, `$2`, ...)
//! - LIMIT ... OFFSET ... pagination

use super::helpers;
use super::SqlDialect;

/// PostgreSQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_dollar(index)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)
}
