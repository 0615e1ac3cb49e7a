//! SQL generation module.
//!
//! A small, type-safe SELECT builder that renders multi-dialect SQL with
//! positional bind parameters:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`value`] - Bind values and rendered statements

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod value;


// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, count, count_distinct, count_star, func, lit_bool, lit_int, lit_null, lit_str, lower,
    max, min, param, star, table_col, BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use query::{Join, JoinType, LimitOffset, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{Token, TokenStream};
pub use value::{BoundSql, SqlValue};
