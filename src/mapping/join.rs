//! Join descriptors and the per-request join set.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use super::table::TableReference;
use crate::sql::{ExprExt, Join, JoinType};

/// One relational join from an already-present table to the table it introduces.
///
/// Identity is `(source, target, source_column, target_column)`; the outer
/// and cardinality flags do not take part in equality or hashing.
#[derive(Debug, Clone)]
pub struct JoinDescriptor {
    pub source: TableReference,
    pub target: TableReference,
    pub source_column: String,
    pub target_column: String,
    pub outer: bool,
    /// The target holds many rows per source row.
    pub to_many: bool,
}

impl JoinDescriptor {
    pub fn new(
        source: TableReference,
        source_column: impl Into<String>,
        target: TableReference,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            source_column: source_column.into(),
            target_column: target_column.into(),
            outer: false,
            to_many: false,
        }
    }

    pub fn outer(mut self) -> Self {
        self.outer = true;
        self
    }

    pub fn to_many(mut self) -> Self {
        self.to_many = true;
        self
    }

    /// The JOIN clause for the SQL builder.
    pub fn to_join(&self) -> Join {
        Join {
            join_type: if self.outer {
                JoinType::Left
            } else {
                JoinType::Inner
            },
            table: self.target.to_table_ref(),
            on: self
                .source
                .column(&self.source_column)
                .eq(self.target.column(&self.target_column)),
        }
    }

    fn identity(&self) -> (&TableReference, &TableReference, &str, &str) {
        (
            &self.source,
            &self.target,
            &self.source_column,
            &self.target_column,
        )
    }
}

impl PartialEq for JoinDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for JoinDescriptor {}

impl Hash for JoinDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Display for JoinDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{} ({})",
            self.source.alias,
            self.source_column,
            self.target.alias,
            self.target_column,
            self.target.table
        )
    }
}

/// Deduplicated joins in first-registered order.
#[derive(Debug, Clone, Default)]
pub struct JoinSet {
    joins: Vec<JoinDescriptor>,
    seen: HashSet<JoinDescriptor>,
}

impl JoinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a join. Returns false if an equal join was already present.
    pub fn insert(&mut self, join: JoinDescriptor) -> bool {
        if self.seen.contains(&join) {
            return false;
        }
        self.seen.insert(join.clone());
        self.joins.push(join);
        true
    }

    pub fn extend<'a>(&mut self, joins: impl IntoIterator<Item = &'a JoinDescriptor>) {
        for join in joins {
            self.insert(join.clone());
        }
    }

    pub fn union(&mut self, other: &JoinSet) {
        self.extend(other.iter());
    }

    pub fn iter(&self) -> impl Iterator<Item = &JoinDescriptor> {
        self.joins.iter()
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Whether any registered join multiplies root rows.
    pub fn has_to_many(&self) -> bool {
        self.joins.iter().any(|j| j.to_many)
    }
}

impl<'a> IntoIterator for &'a JoinSet {
    type Item = &'a JoinDescriptor;
    type IntoIter = std::slice::Iter<'a, JoinDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.joins.iter()
    }
}
