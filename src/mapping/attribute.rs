//! Resolved attribute locations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::join::JoinDescriptor;
use super::table::TableReference;
use crate::sql::Expr;

/// Declared SCIM type of an attribute's column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    #[default]
    String,
    Reference,
    Boolean,
    Integer,
    Decimal,
    /// Stored as epoch milliseconds.
    DateTime,
}

impl AttributeType {
    /// String-like types support substring operators and case folding.
    pub fn is_textual(self) -> bool {
        matches!(self, AttributeType::String | AttributeType::Reference)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "string",
            AttributeType::Reference => "reference",
            AttributeType::Boolean => "boolean",
            AttributeType::Integer => "integer",
            AttributeType::Decimal => "decimal",
            AttributeType::DateTime => "dateTime",
        };
        write!(f, "{}", name)
    }
}

/// Where an attribute lives and how to reach it from the root table.
///
/// Built once when a resource type is registered and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeLocation {
    pub schema_uri: String,
    pub parent: Option<String>,
    pub name: String,
    pub table: TableReference,
    pub column: String,
    /// Joins from the root to `table`, in dependency order.
    pub required_joins: Vec<JoinDescriptor>,
    pub attr_type: AttributeType,
    pub case_exact: bool,
}

impl AttributeLocation {
    /// True when reaching the column can multiply root rows.
    pub fn multi_valued(&self) -> bool {
        self.required_joins.iter().any(|j| j.to_many)
    }

    /// `parent.name` or `name`.
    pub fn full_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.schema_uri, self.full_name())
    }

    pub fn column_expr(&self) -> Expr {
        self.table.column(&self.column)
    }

    /// Whether string comparisons should fold case.
    pub fn folds_case(&self) -> bool {
        self.attr_type.is_textual() && !self.case_exact
    }
}

impl fmt::Display for AttributeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}.{} ({})",
            self.qualified_name(),
            self.table.alias,
            self.column,
            self.attr_type
        )
    }
}
