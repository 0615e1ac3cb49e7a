//! Literal coercion to a column's declared type.

use chrono::DateTime;

use super::node::{CompareOp, FilterValue};
use crate::error::{QueryError, Result};
use crate::mapping::{AttributeLocation, AttributeType};
use crate::sql::SqlValue;

/// Reject operators that make no sense for the attribute's type.
pub fn check_operator(
    location: &AttributeLocation,
    path: &str,
    op: CompareOp,
    value: &FilterValue,
) -> Result<()> {
    let allowed = match location.attr_type {
        _ if op == CompareOp::Pr => true,
        AttributeType::String | AttributeType::Reference => true,
        AttributeType::Boolean => matches!(op, CompareOp::Eq | CompareOp::Ne),
        AttributeType::Integer | AttributeType::Decimal | AttributeType::DateTime => {
            !op.is_pattern()
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(QueryError::invalid_value(
            path,
            value,
            format!("operator '{}' is not supported for {} attributes", op, location.attr_type),
        ))
    }
}

/// Convert a non-null filter literal into the bind value for the column.
pub fn coerce(location: &AttributeLocation, path: &str, value: &FilterValue) -> Result<SqlValue> {
    let fail = |reason: &str| QueryError::invalid_value(path, value, reason);

    match (location.attr_type, value) {
        (_, FilterValue::Null) => Err(fail("null is only valid with eq and ne")),

        (AttributeType::String | AttributeType::Reference, FilterValue::String(s)) => {
            Ok(SqlValue::Text(s.clone()))
        }
        (AttributeType::String | AttributeType::Reference, FilterValue::Int(n)) => {
            Ok(SqlValue::Text(n.to_string()))
        }
        (AttributeType::String | AttributeType::Reference, FilterValue::Float(x)) => {
            Ok(SqlValue::Text(x.to_string()))
        }
        (AttributeType::String | AttributeType::Reference, FilterValue::Bool(b)) => {
            Ok(SqlValue::Text(b.to_string()))
        }

        (AttributeType::Boolean, FilterValue::Bool(b)) => Ok(SqlValue::Bool(*b)),
        (AttributeType::Boolean, FilterValue::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(SqlValue::Bool(true)),
            "false" => Ok(SqlValue::Bool(false)),
            _ => Err(fail("expected a boolean")),
        },
        (AttributeType::Boolean, _) => Err(fail("expected a boolean")),

        (AttributeType::Integer, FilterValue::Int(n)) => Ok(SqlValue::Int(*n)),
        (AttributeType::Integer, FilterValue::Float(x))
            if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x <= i64::MAX as f64 =>
        {
            Ok(SqlValue::Int(*x as i64))
        }
        (AttributeType::Integer, FilterValue::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|_| fail("expected an integer")),
        (AttributeType::Integer, _) => Err(fail("expected an integer")),

        (AttributeType::Decimal, FilterValue::Int(n)) => Ok(SqlValue::Float(*n as f64)),
        (AttributeType::Decimal, FilterValue::Float(x)) if x.is_finite() => {
            Ok(SqlValue::Float(*x))
        }
        (AttributeType::Decimal, FilterValue::String(s)) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(SqlValue::Float(x)),
            _ => Err(fail("expected a decimal number")),
        },
        (AttributeType::Decimal, _) => Err(fail("expected a decimal number")),

        (AttributeType::DateTime, FilterValue::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| SqlValue::Int(dt.timestamp_millis()))
            .map_err(|_| fail("expected an RFC 3339 timestamp")),
        (AttributeType::DateTime, _) => Err(fail("expected an RFC 3339 timestamp")),
    }
}
