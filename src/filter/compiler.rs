//! Filter tree to SQL predicate compilation.
//!
//! Each comparison resolves its attribute through the resource's mapping
//! table, registers the joins needed to reach the column and emits a
//! parameterized predicate. Bind values live inside the predicate as
//! [`Expr::Param`], so rendering numbers placeholders and collects values in
//! the same left-to-right pass.
//!
//! Negation is entity-level: `not` over a subtree that crosses a one-to-many
//! join selects the root entities for which *no* joined row matches, via
//! `root.id NOT IN (SELECT root.id ...)`.

use super::coerce::{check_operator, coerce};
use super::node::{CompareOp, Comparison, FilterNode, FilterValue};
use crate::error::{QueryError, Result};
use crate::mapping::{
    linearize, AttributeLocation, AttributePath, JoinSet, Resolved, ResourceMapping,
};
use crate::sql::{lower, param, BoundSql, Dialect, Expr, ExprExt, Query, SqlValue};

/// Escape character for LIKE patterns.
pub const LIKE_ESCAPE: char = '!';

/// A compiled predicate plus the joins it needs in the outer query.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub predicate: Expr,
    pub joins: JoinSet,
}

impl CompiledFilter {
    /// Bind values in placeholder order.
    pub fn params(&self) -> Vec<SqlValue> {
        self.predicate.params()
    }

    pub fn bind(&self, dialect: Dialect) -> BoundSql {
        self.predicate.bind(dialect)
    }
}

/// Compiles filter trees against one resource type.
pub struct FilterCompiler<'a> {
    resource: &'a ResourceMapping,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(resource: &'a ResourceMapping) -> Self {
        Self { resource }
    }

    pub fn compile(&self, node: &FilterNode) -> Result<CompiledFilter> {
        let mut joins = JoinSet::new();
        let predicate = self.compile_node(node, &mut joins)?;
        tracing::debug!(
            resource = %self.resource.name,
            filter = %node,
            joins = joins.len(),
            "Compiled filter"
        );
        Ok(CompiledFilter { predicate, joins })
    }

    fn compile_node(&self, node: &FilterNode, joins: &mut JoinSet) -> Result<Expr> {
        match node {
            FilterNode::Comparison(comparison) => self.compile_comparison(comparison, joins),
            FilterNode::And(left, right) => {
                let left = self.compile_node(left, joins)?;
                let right = self.compile_node(right, joins)?;
                Ok(left.and(right).paren())
            }
            FilterNode::Or(left, right) => {
                let left = self.compile_node(left, joins)?;
                let right = self.compile_node(right, joins)?;
                Ok(left.or(right).paren())
            }
            FilterNode::Not(child) => self.compile_not(child, joins),
        }
    }

    fn compile_not(&self, child: &FilterNode, joins: &mut JoinSet) -> Result<Expr> {
        let mut inner = JoinSet::new();
        let predicate = self.compile_node(child, &mut inner)?;

        if !inner.has_to_many() {
            joins.union(&inner);
            return Ok(predicate.not());
        }

        let root = &self.resource.root;
        let mut matching = Query::new()
            .select(vec![self.resource.id_expr()])
            .from(root.to_table_ref());
        for join in linearize(root, &inner)? {
            matching = matching.join(join.to_join());
        }
        let matching = matching.filter(predicate);

        Ok(self.resource.id_expr().not_in_subquery(matching))
    }

    fn compile_comparison(&self, comparison: &Comparison, joins: &mut JoinSet) -> Result<Expr> {
        let path = AttributePath::parse(&comparison.path)?;

        let location = match self.resource.resolve_path(&path)? {
            Resolved::Attribute(location) => location,
            Resolved::Complex(complex) if comparison.op == CompareOp::Pr => {
                let mut presence: Option<Expr> = None;
                for child in &complex.children {
                    joins.extend(&child.required_joins);
                    let check = presence_check(child);
                    presence = Some(match presence {
                        Some(acc) => acc.or(check),
                        None => check,
                    });
                }
                return presence
                    .map(|p| p.paren())
                    .ok_or_else(|| QueryError::unknown_attribute(&comparison.path));
            }
            Resolved::Complex(complex) => complex
                .value_child()
                .ok_or_else(|| QueryError::unknown_attribute(&comparison.path))?,
        };

        joins.extend(&location.required_joins);
        compare(location, &comparison.path, comparison.op, &comparison.value)
    }
}

/// Predicate for one attribute comparison.
fn compare(
    location: &AttributeLocation,
    path: &str,
    op: CompareOp,
    value: &FilterValue,
) -> Result<Expr> {
    let column = location.column_expr();

    if op == CompareOp::Pr {
        return Ok(presence_check(location));
    }

    if let FilterValue::Null = value {
        return match op {
            CompareOp::Eq => Ok(column.is_null()),
            CompareOp::Ne => Ok(column.is_not_null()),
            _ => Err(QueryError::invalid_value(
                path,
                value,
                "null is only valid with eq and ne",
            )),
        };
    }

    check_operator(location, path, op, value)?;
    let bound = coerce(location, path, value)?;

    let rhs = match (op, bound.as_str()) {
        (CompareOp::Co, Some(text)) => param(format!("%{}%", escape_like(text))),
        (CompareOp::Sw, Some(text)) => param(format!("{}%", escape_like(text))),
        (CompareOp::Ew, Some(text)) => param(format!("%{}", escape_like(text))),
        _ => param(bound.clone()),
    };
    let (column, rhs) = if location.folds_case() {
        (lower(column), lower(rhs))
    } else {
        (column, rhs)
    };

    Ok(match op {
        CompareOp::Eq => column.eq(rhs),
        CompareOp::Ne => column.ne(rhs),
        CompareOp::Gt => column.gt(rhs),
        CompareOp::Ge => column.gte(rhs),
        CompareOp::Lt => column.lt(rhs),
        CompareOp::Le => column.lte(rhs),
        CompareOp::Co | CompareOp::Sw | CompareOp::Ew | CompareOp::Pr => {
            column.like_escape(rhs, LIKE_ESCAPE)
        }
    })
}

/// Two-valued presence test: never evaluates to unknown.
fn presence_check(location: &AttributeLocation) -> Expr {
    let column = location.column_expr();
    if location.attr_type.is_textual() {
        column
            .clone()
            .is_not_null()
            .and(column.ne(""))
            .paren()
    } else {
        column.is_not_null()
    }
}

/// Escape LIKE wildcards in a user value, including T-SQL character classes.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '[' | ']' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}
