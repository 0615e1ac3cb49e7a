//! Physical table references.

use std::fmt;

use crate::sql::{table_col, Expr, TableRef};

/// A physical table plus the alias it carries in generated queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableReference {
    pub table: String,
    pub alias: String,
}

impl TableReference {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
        }
    }

    /// `alias.column` expression.
    pub fn column(&self, column: &str) -> Expr {
        table_col(&self.alias, column)
    }

    /// FROM/JOIN target for the SQL builder.
    pub fn to_table_ref(&self) -> TableRef {
        TableRef::new(&self.table).with_alias(&self.alias)
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.table, self.alias)
    }
}
