//! Sort key resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};
use crate::mapping::{AttributeLocation, AttributePath, Resolved, ResourceMapping};
use crate::sql::{lower, max, min, Expr, OrderByExpr, SortDir};

/// SCIM `sortOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn dir(self) -> SortDir {
        match self {
            SortOrder::Ascending => SortDir::Asc,
            SortOrder::Descending => SortDir::Desc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => f.write_str("ascending"),
            SortOrder::Descending => f.write_str("descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortOrder::Ascending),
            "descending" | "desc" => Ok(SortOrder::Descending),
            other => Err(format!("invalid sort order '{}'", other)),
        }
    }
}

/// A resolved `sortBy` attribute with its direction.
#[derive(Debug, Clone)]
pub struct SortKey<'a> {
    pub location: &'a AttributeLocation,
    pub order: SortOrder,
}

impl<'a> SortKey<'a> {
    /// Resolve `sortBy` the same way filter attributes are resolved. A complex
    /// parent sorts by its `value` sub-attribute.
    pub fn resolve(resource: &'a ResourceMapping, sort_by: &str, order: SortOrder) -> Result<Self> {
        let path = AttributePath::parse(sort_by)?;
        let location = match resource.resolve_path(&path)? {
            Resolved::Attribute(location) => location,
            Resolved::Complex(complex) => complex
                .value_child()
                .ok_or_else(|| QueryError::unknown_attribute(sort_by))?,
        };
        Ok(Self { location, order })
    }

    /// Whether rows must be grouped to sort by this key.
    pub fn needs_aggregate(&self) -> bool {
        self.location.multi_valued()
    }

    /// ORDER BY item. Multi-valued keys sort by their smallest value ascending
    /// and their largest value descending.
    pub fn order_by(&self) -> OrderByExpr {
        let mut key: Expr = self.location.column_expr();
        if self.location.folds_case() {
            key = lower(key);
        }
        if self.needs_aggregate() {
            key = match self.order {
                SortOrder::Ascending => min(key),
                SortOrder::Descending => max(key),
            };
        }
        OrderByExpr {
            expr: key,
            dir: Some(self.order.dir()),
        }
    }
}
