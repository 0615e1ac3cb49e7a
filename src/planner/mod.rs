//! Query planner - turns a filter, sort key and page into executable plans.
//!
//! Each request produces:
//! 1. A row plan: root id plus single-valued columns, tenant and static
//!    restrictions, compiled filter, sort key with root id tie-breaker, paging
//! 2. A count plan: `COUNT(DISTINCT root.id)` over the same joins and predicate
//! 3. Association plans: one follow-up per declared collection, run for the
//!    ids of the selected page only
//!
//! Rows multiplied by one-to-many joins are collapsed by grouping on the
//! projection, so paging always counts root entities.

pub mod plan;
pub mod sort;

pub use plan::{
    AssociationPlan, Page, PageRequest, PlannedQuery, QueryPlan, QueryPlanner, TenantRestriction,
};
pub use sort::{SortKey, SortOrder};
