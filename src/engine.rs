//! The `query()` entry point.
//!
//! A [`QueryEngine`] borrows a self-checked [`ResourceRegistry`] and answers
//! [`QueryRequest`]s against any [`QueryExecutor`]. The engine is immutable and
//! can be shared across threads; executors are request-scoped.

use serde::{Deserialize, Serialize};

use crate::config::QuerySettings;
use crate::error::Result;
use crate::executor::{execute, QueryExecutor, ResultRow};
use crate::filter::FilterNode;
use crate::mapping::{AttributeLocation, ResourceRegistry};
use crate::planner::{PageRequest, PlannedQuery, QueryPlanner, SortOrder, TenantRestriction};

/// One list/search request for a resource type within a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub resource: String,
    pub tenant: String,
    #[serde(default)]
    pub filter: Option<FilterNode>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default = "default_start_index")]
    pub start_index: i64,
    #[serde(default)]
    pub count: Option<i64>,
}

fn default_start_index() -> i64 {
    1
}

impl QueryRequest {
    pub fn new(resource: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            tenant: tenant.into(),
            filter: None,
            sort_by: None,
            sort_order: None,
            start_index: default_start_index(),
            count: None,
        }
    }

    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort_by(mut self, path: impl Into<String>) -> Self {
        self.sort_by = Some(path.into());
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    /// 1-based `startIndex` and optional `count`.
    pub fn page(mut self, start_index: i64, count: Option<i64>) -> Self {
        self.start_index = start_index;
        self.count = count;
        self
    }

    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.start_index, self.count)
    }
}

/// A page of root entities plus list-response metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub total_results: u64,
    pub start_index: u64,
    pub items_per_page: u64,
    pub rows: Vec<ResultRow>,
}

pub struct QueryEngine<'r> {
    registry: &'r ResourceRegistry,
    settings: QuerySettings,
}

impl<'r> QueryEngine<'r> {
    pub fn new(registry: &'r ResourceRegistry, settings: QuerySettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &'r ResourceRegistry {
        self.registry
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Attribute lookup by `(schema, parent, name)` within a resource type.
    pub fn resolve(
        &self,
        resource: &str,
        schema_uri: Option<&str>,
        parent: Option<&str>,
        name: &str,
    ) -> Result<&'r AttributeLocation> {
        self.registry.resolve(resource, schema_uri, parent, name)
    }

    /// Build the row, count and association plans without touching the database.
    pub fn plan(&self, request: &QueryRequest) -> Result<PlannedQuery> {
        let resource = self.registry.get(&request.resource)?;
        let tenant = TenantRestriction::new(resource, request.tenant.as_str());
        QueryPlanner::new(resource, &self.settings).plan(
            &tenant,
            request.filter.as_ref(),
            request.sort_by.as_deref(),
            request.sort_order,
            request.page_request(),
        )
    }

    /// Plan and execute a request.
    pub fn query<E: QueryExecutor>(
        &self,
        executor: &mut E,
        request: &QueryRequest,
    ) -> Result<QueryResult> {
        let plan = self.plan(request)?;
        let execution = execute(executor, &plan)?;

        tracing::info!(
            resource = %plan.resource,
            tenant = %request.tenant,
            total = execution.total,
            returned = execution.rows.len(),
            start_index = plan.page.start_index,
            "Query completed"
        );

        Ok(QueryResult {
            total_results: execution.total,
            start_index: plan.page.start_index,
            items_per_page: execution.rows.len() as u64,
            rows: execution.rows,
        })
    }
}
