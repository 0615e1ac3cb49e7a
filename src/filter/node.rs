//! Filter expression trees.
//!
//! Trees are produced by the protocol layer's filter parser. They can also be
//! read from JSON:
//!
//! ```json
//! {"and": [
//!   {"comparison": {"path": "userName", "op": "sw", "value": "a"}},
//!   {"not": {"comparison": {"path": "emails", "op": "pr"}}}
//! ]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operators of the SCIM filter grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
    Pr,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Co => "co",
            CompareOp::Sw => "sw",
            CompareOp::Ew => "ew",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Pr => "pr",
        }
    }

    /// Substring operators: `co`, `sw`, `ew`.
    pub fn is_pattern(self) -> bool {
        matches!(self, CompareOp::Co | CompareOp::Sw | CompareOp::Ew)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Null => f.write_str("null"),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Int(n) => write!(f, "{}", n),
            FilterValue::Float(x) => write!(f, "{}", x),
            FilterValue::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        FilterValue::Float(x)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

/// `attributePath op value`. The value is ignored for `pr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub path: String,
    pub op: CompareOp,
    #[serde(default)]
    pub value: FilterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
    Comparison(Comparison),
    And(Box<FilterNode>, Box<FilterNode>),
    Or(Box<FilterNode>, Box<FilterNode>),
    Not(Box<FilterNode>),
}

impl FilterNode {
    pub fn and(self, other: FilterNode) -> FilterNode {
        FilterNode::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FilterNode) -> FilterNode {
        FilterNode::Or(Box::new(self), Box::new(other))
    }
}

/// Negate a filter.
pub fn not(node: FilterNode) -> FilterNode {
    FilterNode::Not(Box::new(node))
}

/// Start a comparison on an attribute path.
pub fn attr(path: impl Into<String>) -> Attr {
    Attr(path.into())
}

/// Comparison builder returned by [`attr`].
#[derive(Debug, Clone)]
pub struct Attr(String);

impl Attr {
    fn compare(self, op: CompareOp, value: FilterValue) -> FilterNode {
        FilterNode::Comparison(Comparison {
            path: self.0,
            op,
            value,
        })
    }

    pub fn eq(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Ne, value.into())
    }

    pub fn co(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Co, value.into())
    }

    pub fn sw(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Sw, value.into())
    }

    pub fn ew(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Ew, value.into())
    }

    pub fn gt(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Gt, value.into())
    }

    pub fn ge(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Ge, value.into())
    }

    pub fn lt(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Lt, value.into())
    }

    pub fn le(self, value: impl Into<FilterValue>) -> FilterNode {
        self.compare(CompareOp::Le, value.into())
    }

    pub fn pr(self) -> FilterNode {
        self.compare(CompareOp::Pr, FilterValue::Null)
    }

    /// `eq null`.
    pub fn is_null(self) -> FilterNode {
        self.compare(CompareOp::Eq, FilterValue::Null)
    }
}

/// Renders SCIM filter syntax, fully parenthesized.
impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison(c) if c.op == CompareOp::Pr => write!(f, "{} pr", c.path),
            FilterNode::Comparison(c) => write!(f, "{} {} {}", c.path, c.op, c.value),
            FilterNode::And(l, r) => write!(f, "({} and {})", l, r),
            FilterNode::Or(l, r) => write!(f, "({} or {})", l, r),
            FilterNode::Not(child) => write!(f, "not ({})", child),
        }
    }
}
