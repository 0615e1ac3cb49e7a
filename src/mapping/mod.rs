//! Attribute mapping layer.
//!
//! Maps SCIM attribute paths onto physical columns and the joins needed to
//! reach them:
//!
//! ```text
//! (schema URI, parent, name) ──resolve──► AttributeLocation
//!                                           ├─ table / column
//!                                           └─ required_joins ──► JoinSet
//!                                                                  │
//!                                                              linearize
//!                                                                  ▼
//!                                                            ordered joins
//! ```
//!
//! Mappings are declared as data ([`decl`]), built once into a
//! [`ResourceRegistry`] that self-checks every declaration, and shared
//! read-only afterwards.

pub mod attribute;
pub mod decl;
pub mod join;
pub mod linearize;
pub mod path;
pub mod registry;
pub mod table;

pub use attribute::{AttributeLocation, AttributeType};
pub use decl::{CatalogDecl, ResourceDecl};
pub use join::{JoinDescriptor, JoinSet};
pub use linearize::linearize;
pub use path::AttributePath;
pub use registry::{
    Association, AssociationColumn, ComplexAttribute, Resolved, ResourceMapping, ResourceRegistry,
};
pub use table::TableReference;
