//! Filter predicate compilation.

pub mod coerce;
pub mod compiler;
pub mod node;

pub use compiler::{escape_like, CompiledFilter, FilterCompiler, LIKE_ESCAPE};
pub use node::{attr, not, Attr, CompareOp, Comparison, FilterNode, FilterValue};
