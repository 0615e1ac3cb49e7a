//! SCIM attribute paths.
//!
//! Accepts the forms a filter or `sortBy` parameter may use:
//!
//! - `userName`
//! - `name.givenName`
//! - `urn:ietf:params:scim:schemas:core:2.0:User:name.givenName`
//! - `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber`

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

static ATTRNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\$ref|[A-Za-z][A-Za-z0-9_-]*)$").unwrap());

/// A parsed attribute path: optional schema URI, optional parent, attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributePath {
    pub schema: Option<String>,
    pub parent: Option<String>,
    pub name: String,
}

impl AttributePath {
    /// A relative, unqualified path.
    pub fn new(parent: Option<&str>, name: &str) -> Self {
        Self {
            schema: None,
            parent: parent.map(str::to_string),
            name: name.to_string(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let qualified = input
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("urn:"));
        let (schema, rest) = if qualified {
            match input.rfind(':') {
                Some(idx) if idx + 1 < input.len() => {
                    (Some(input[..idx].to_string()), &input[idx + 1..])
                }
                _ => return Err(QueryError::unknown_attribute(input)),
            }
        } else {
            (None, input)
        };

        let mut parts = rest.split('.');
        let (parent, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, _) => (None, name),
            (Some(parent), Some(name), None) => (Some(parent), name),
            _ => return Err(QueryError::unknown_attribute(input)),
        };

        for part in parent.iter().chain(std::iter::once(&name)) {
            if !ATTRNAME.is_match(part) {
                return Err(QueryError::unknown_attribute(input));
            }
        }

        Ok(Self {
            schema,
            parent: parent.map(str::to_string),
            name: name.to_string(),
        })
    }

    /// `parent.name` or `name`, without the schema.
    pub fn relative(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}:", schema)?;
        }
        write!(f, "{}", self.relative())
    }
}

impl std::str::FromStr for AttributePath {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AttributePath {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<AttributePath> for String {
    fn from(path: AttributePath) -> Self {
        path.to_string()
    }
}
