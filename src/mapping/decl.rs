//! Declarative resource mappings.
//!
//! These types are the on-disk shape of a catalog. They are deserialized from
//! TOML, turned into [`ResourceMapping`](super::ResourceMapping)s and then
//! discarded.

use serde::{Deserialize, Serialize};

use super::attribute::AttributeType;
use crate::sql::SqlValue;

/// A set of resource declarations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDecl {
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    /// Resource type name, e.g. `User`.
    pub name: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Core schema URI.
    pub schema: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    pub root: TableDecl,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Root column holding the tenant (realm) identifier.
    pub tenant_column: String,
    #[serde(default)]
    pub restrictions: Vec<RestrictionDecl>,
    #[serde(default)]
    pub tables: Vec<TableDecl>,
    #[serde(default)]
    pub joins: Vec<JoinDecl>,
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    #[serde(default)]
    pub associations: Vec<AssociationDecl>,
}

fn default_id_column() -> String {
    "ID".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDecl {
    pub table: String,
    pub alias: String,
}

/// A fixed predicate on a root column, ANDed into every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionDecl {
    pub column: String,
    pub op: RestrictionOp,
    #[serde(default)]
    pub value: Option<SqlValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestrictionOp {
    IsNull,
    IsNotNull,
    Eq,
}

/// A named join between two declared table aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinDecl {
    pub name: String,
    pub source: String,
    pub source_column: String,
    pub target: String,
    pub target_column: String,
    #[serde(default)]
    pub outer: bool,
    #[serde(default)]
    pub to_many: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Defaults to the resource's core schema.
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    pub name: String,
    /// Table alias holding the column; defaults to the last join's target, or the root.
    #[serde(default)]
    pub table: Option<String>,
    pub column: String,
    #[serde(default, rename = "type")]
    pub attr_type: AttributeType,
    #[serde(default)]
    pub case_exact: bool,
    /// Names of the joins leading from the root to `table`, in order.
    #[serde(default)]
    pub joins: Vec<String>,
}

/// A multi-valued collection loaded with a follow-up query per page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationDecl {
    pub name: String,
    pub joins: Vec<String>,
    pub columns: Vec<AssociationColumnDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationColumnDecl {
    pub label: String,
    pub table: String,
    pub column: String,
}
