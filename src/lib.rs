//! # scimql
//!
//! Compiles SCIM list/search requests over identity resources into
//! parameterized, multi-dialect SQL against a fixed relational schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         Resource catalog (TOML declarations)             │
//! │   (tables, named joins, attributes, associations)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [mapping: registry + self-check]
//! ┌─────────────────────────────────────────────────────────┐
//! │     ResourceRegistry (AttributeLocation per attribute)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!        filter tree ──────┤ [filter: compiler]
//!        sortBy/page ──────┤ [planner + linearizer]
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │      PlannedQuery (row plan, count plan, associations)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor: count, rows, follow-ups]
//! ┌─────────────────────────────────────────────────────────┐
//! │               ResultRow per root entity                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use scimql::prelude::*;
//!
//! # fn main() -> scimql::error::Result<()> {
//! let registry = scimql::catalog::keycloak()?;
//! let engine = QueryEngine::new(&registry, QuerySettings::default());
//! let request = QueryRequest::new("User", "realm-1")
//!     .filter(attr("userName").sw("ali"))
//!     .sort_by("name.familyName")
//!     .page(1, Some(20));
//!
//! let plan = engine.plan(&request)?;
//! println!("{}", plan.rows.bind(Dialect::Postgres).sql);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filter;
pub mod mapping;
pub mod planner;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{QuerySettings, Settings};
    pub use crate::engine::{QueryEngine, QueryRequest, QueryResult};
    pub use crate::error::{ErrorKind, QueryError, ScimErrorType};
    pub use crate::executor::{QueryExecutor, ResultRow, SqliteExecutor};
    pub use crate::filter::{attr, not, CompareOp, FilterNode, FilterValue};
    pub use crate::mapping::{AttributeLocation, ResourceRegistry};
    pub use crate::planner::{PlannedQuery, SortOrder};
    pub use crate::sql::{BoundSql, Dialect, SqlValue};
}

pub use engine::{QueryEngine, QueryRequest, QueryResult};
pub use error::{QueryError, Result};
pub use sql::Dialect;
