//! Plan execution and result mapping.
//!
//! The database is reached through the narrow [`QueryExecutor`] capability so
//! the engine does not depend on any particular driver. Statements run in a
//! fixed order on the calling thread: count, then rows, then association
//! follow-ups for the ids of the page.

pub mod mapper;
pub mod sqlite;

pub use mapper::{ResultMapper, ResultRow};
pub use sqlite::SqliteExecutor;

use crate::error::{QueryError, Result};
use crate::planner::PlannedQuery;
use crate::sql::{BoundSql, Dialect, SqlValue};

/// Request-scoped access to the database.
pub trait QueryExecutor {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Dialect the statements must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a single-value count statement.
    fn count(&mut self, statement: &BoundSql) -> std::result::Result<u64, Self::Error>;

    /// Run the row statement and return its tuples in result order.
    fn rows(
        &mut self,
        statement: &BoundSql,
    ) -> std::result::Result<Vec<Vec<SqlValue>>, Self::Error>;

    /// Run an association follow-up and return its tuples in result order.
    fn association_rows(
        &mut self,
        statement: &BoundSql,
    ) -> std::result::Result<Vec<Vec<SqlValue>>, Self::Error>;
}

/// Rows of one page plus the total number of matching root entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub rows: Vec<ResultRow>,
    pub total: u64,
}

/// Execute a planned query.
pub fn execute<E: QueryExecutor>(executor: &mut E, plan: &PlannedQuery) -> Result<Execution> {
    let dialect = executor.dialect();

    let statement = plan.count.bind(dialect);
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "Count query");
    let total = executor.count(&statement).map_err(QueryError::database)?;

    if total == 0 {
        return Ok(Execution {
            rows: Vec::new(),
            total,
        });
    }
    if plan.page.limit == 0 || plan.page.offset >= total {
        tracing::debug!(
            total,
            offset = plan.page.offset,
            limit = plan.page.limit,
            "Page is empty, skipping row query"
        );
        return Ok(Execution {
            rows: Vec::new(),
            total,
        });
    }

    let statement = plan.rows.bind(dialect);
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "Row query");
    let mut mapper = ResultMapper::new();
    for tuple in executor.rows(&statement).map_err(QueryError::database)? {
        mapper.push_row(&plan.labels, tuple);
    }

    let ids = mapper.ids();
    if !ids.is_empty() {
        for association in &plan.associations {
            let statement = association.query_for(&ids).bind(dialect);
            tracing::debug!(
                association = %association.name,
                sql = %statement.sql,
                params = statement.params.len(),
                "Association query"
            );
            let tuples = executor
                .association_rows(&statement)
                .map_err(QueryError::database)?;
            for tuple in tuples {
                mapper.push_association(&association.name, &association.labels, tuple);
            }
        }
    }

    Ok(Execution {
        rows: mapper.finish(),
        total,
    })
}
