//! Error taxonomy for query compilation and execution.

use thiserror::Error;

/// Errors raised while resolving, planning or executing a resource query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown attribute: {path}")]
    UnknownAttribute { path: String },

    #[error("Inconsistent join graph rooted at '{root}': {reason}")]
    InconsistentJoinGraph { root: String, reason: String },

    #[error("Invalid filter value {value} for '{path}': {reason}")]
    InvalidFilterValue {
        path: String,
        value: String,
        reason: String,
    },

    #[error("Invalid resource declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Coarse classification for the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong; report as a 400-style error.
    ClientInput,
    /// A defect in the static declarations.
    Internal,
    /// Propagated from the database driver.
    Database,
}

/// SCIM `scimType` detail values (RFC 7644 section 3.12) for client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScimErrorType {
    InvalidFilter,
    InvalidValue,
}

impl std::fmt::Display for ScimErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScimErrorType::InvalidFilter => write!(f, "invalidFilter"),
            ScimErrorType::InvalidValue => write!(f, "invalidValue"),
        }
    }
}

impl QueryError {
    pub fn unknown_attribute(path: impl Into<String>) -> Self {
        QueryError::UnknownAttribute { path: path.into() }
    }

    pub fn invalid_value(
        path: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        QueryError::InvalidFilterValue {
            path: path.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn inconsistent_joins(root: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InconsistentJoinGraph {
            root: root.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a driver error, keeping it as the source.
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QueryError::Database(Box::new(err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::UnknownResourceType(_)
            | QueryError::UnknownAttribute { .. }
            | QueryError::InvalidFilterValue { .. } => ErrorKind::ClientInput,
            QueryError::InconsistentJoinGraph { .. } | QueryError::InvalidDeclaration(_) => {
                ErrorKind::Internal
            }
            QueryError::Database(_) => ErrorKind::Database,
        }
    }

    pub fn scim_type(&self) -> Option<ScimErrorType> {
        match self {
            QueryError::UnknownAttribute { .. } => Some(ScimErrorType::InvalidFilter),
            QueryError::InvalidFilterValue { .. } => Some(ScimErrorType::InvalidValue),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
