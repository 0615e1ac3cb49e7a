//! Row, count and association plans.

use serde::Serialize;

use super::sort::{SortKey, SortOrder};
use crate::config::QuerySettings;
use crate::error::Result;
use crate::filter::{FilterCompiler, FilterNode};
use crate::mapping::{
    linearize, Association, JoinDescriptor, JoinSet, ResourceMapping, TableReference,
};
use crate::sql::{
    count_distinct, param, BoundSql, Dialect, Expr, ExprExt, OrderByExpr, Query, SqlValue,
};

/// Mandatory `root.tenant_column = ?` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRestriction {
    pub column: String,
    pub tenant_id: String,
}

impl TenantRestriction {
    pub fn new(resource: &ResourceMapping, tenant_id: impl Into<String>) -> Self {
        Self {
            column: resource.tenant_column.clone(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn to_expr(&self, root: &TableReference) -> Expr {
        root.column(&self.column).eq(param(self.tenant_id.as_str()))
    }
}

/// Protocol-level paging input: 1-based `startIndex` and optional `count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub start_index: i64,
    pub count: Option<i64>,
}

impl PageRequest {
    pub fn new(start_index: i64, count: Option<i64>) -> Self {
        Self { start_index, count }
    }

    /// Normalize against the configured limits.
    pub fn resolve(&self, settings: &QuerySettings) -> Page {
        let start_index = self.start_index.max(1) as u64;
        let requested = self.count.unwrap_or(settings.default_count as i64).max(0) as u64;
        let limit = if requested > settings.max_results {
            tracing::warn!(
                requested,
                max_results = settings.max_results,
                "Requested count exceeds maxResults, clamping"
            );
            settings.max_results
        } else {
            requested
        };
        Page {
            start_index,
            offset: start_index - 1,
            limit,
        }
    }
}

/// Resolved paging window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub start_index: u64,
    pub offset: u64,
    pub limit: u64,
}

/// One executable statement plus the joins it was built from.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub root: TableReference,
    pub joins: Vec<JoinDescriptor>,
    pub query: Query,
}

impl QueryPlan {
    pub fn bind(&self, dialect: Dialect) -> BoundSql {
        self.query.bind(dialect)
    }
}

/// Follow-up query for one association, parameterized by page ids.
#[derive(Debug, Clone)]
pub struct AssociationPlan {
    pub name: String,
    /// Labels of the columns following the root id.
    pub labels: Vec<String>,
    template: Query,
    id: Expr,
}

impl AssociationPlan {
    fn new(resource: &ResourceMapping, association: &Association) -> Result<Self> {
        let root = &resource.root;
        let id = resource.id_expr();
        let columns: Vec<Expr> = association
            .columns
            .iter()
            .map(|c| c.table.column(&c.column))
            .collect();

        let mut select = vec![id.clone()];
        select.extend(columns.iter().cloned());
        let mut order = vec![OrderByExpr::asc(id.clone())];
        order.extend(columns.into_iter().map(OrderByExpr::asc));

        let mut template = Query::new().select(select).from(root.to_table_ref());
        for mut join in linearize(root, &association.joins)? {
            // Only existing members matter here.
            join.outer = false;
            template = template.join(join.to_join());
        }

        Ok(Self {
            name: association.name.clone(),
            labels: association.columns.iter().map(|c| c.label.clone()).collect(),
            template: template.order_by(order),
            id,
        })
    }

    /// The statement for a page of root ids.
    pub fn query_for(&self, ids: &[SqlValue]) -> Query {
        let ids: Vec<Expr> = ids.iter().cloned().map(param).collect();
        self.template.clone().filter(self.id.clone().in_list(ids))
    }
}

/// Everything needed to answer one request.
#[derive(Debug, Clone)]
pub struct PlannedQuery {
    pub resource: String,
    /// Result labels for the row plan's columns; the first is `id`.
    pub labels: Vec<String>,
    pub rows: QueryPlan,
    pub count: QueryPlan,
    pub associations: Vec<AssociationPlan>,
    pub page: Page,
}

/// Builds plans for one resource type.
pub struct QueryPlanner<'a> {
    resource: &'a ResourceMapping,
    settings: &'a QuerySettings,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(resource: &'a ResourceMapping, settings: &'a QuerySettings) -> Self {
        Self { resource, settings }
    }

    pub fn plan(
        &self,
        tenant: &TenantRestriction,
        filter: Option<&FilterNode>,
        sort_by: Option<&str>,
        sort_order: Option<SortOrder>,
        page: PageRequest,
    ) -> Result<PlannedQuery> {
        let resource = self.resource;
        let root = &resource.root;
        let id = resource.id_expr();
        let page = page.resolve(self.settings);

        let mut joins = JoinSet::new();

        let mut predicate = tenant.to_expr(root);
        for restriction in resource.restrictions() {
            predicate = predicate.and(restriction.clone());
        }
        if let Some(filter) = filter {
            let compiled = FilterCompiler::new(resource).compile(filter)?;
            joins.union(&compiled.joins);
            predicate = predicate.and(compiled.predicate);
        }

        let sort = match sort_by {
            Some(path) => Some(SortKey::resolve(resource, path, sort_order.unwrap_or_default())?),
            None => None,
        };
        if let Some(key) = &sort {
            joins.extend(&key.location.required_joins);
        }

        let mut labels = vec!["id".to_string()];
        let mut projection = vec![id.clone()];
        for location in resource.attributes() {
            if location.multi_valued() || resource.is_id(location) {
                continue;
            }
            joins.extend(&location.required_joins);
            labels.push(resource.label(location));
            projection.push(location.column_expr());
        }

        let ordered = linearize(root, &joins)?;

        let mut base = Query::new().from(root.to_table_ref());
        for join in &ordered {
            base = base.join(join.to_join());
        }
        let base = base.filter(predicate);

        let count = base.clone().select(vec![count_distinct(id.clone())]);

        let mut order = Vec::with_capacity(2);
        if let Some(key) = &sort {
            order.push(key.order_by());
        }
        order.push(OrderByExpr::asc(id.clone()));

        let mut rows = base.select(projection.clone()).order_by(order);
        if joins.has_to_many() {
            rows = rows.group_by(projection);
        }
        let rows = rows.offset(page.offset).limit(page.limit);

        let associations = resource
            .associations()
            .iter()
            .map(|a| AssociationPlan::new(resource, a))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            resource = %resource.name,
            joins = ordered.len(),
            sort = ?sort_by,
            offset = page.offset,
            limit = page.limit,
            "Planned query"
        );

        Ok(PlannedQuery {
            resource: resource.name.clone(),
            labels,
            rows: QueryPlan {
                root: root.clone(),
                joins: ordered.clone(),
                query: rows,
            },
            count: QueryPlan {
                root: root.clone(),
                joins: ordered,
                query: count,
            },
            associations,
            page,
        })
    }
}
