//! Resource catalogs.
//!
//! The built-in catalog maps SCIM `User`, `Group` and `Role` onto the Keycloak
//! relational schema. Deployments with extra columns can load their own TOML
//! catalog in the same format.

use std::path::Path;

use crate::error::{QueryError, Result};
use crate::mapping::{CatalogDecl, ResourceRegistry};

const KEYCLOAK: &str = include_str!("keycloak.toml");

/// Parse a catalog from TOML text.
pub fn from_toml_str(text: &str) -> Result<CatalogDecl> {
    toml::from_str(text).map_err(|e| QueryError::InvalidDeclaration(e.to_string()))
}

/// Load a catalog file.
pub fn load(path: &Path) -> Result<CatalogDecl> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        QueryError::InvalidDeclaration(format!("{}: {}", path.display(), e))
    })?;
    from_toml_str(&text)
}

/// The built-in Keycloak catalog.
pub fn keycloak_decl() -> Result<CatalogDecl> {
    from_toml_str(KEYCLOAK)
}

/// Registry over the built-in Keycloak catalog, self-checked.
pub fn keycloak() -> Result<ResourceRegistry> {
    ResourceRegistry::from_decl(&keycloak_decl()?)
}
