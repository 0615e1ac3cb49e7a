//! Attribute mapping table and resource registry.

use std::collections::HashMap;

use super::attribute::AttributeLocation;
use super::decl::{CatalogDecl, ResourceDecl, RestrictionOp};
use super::join::{JoinDescriptor, JoinSet};
use super::linearize::linearize;
use super::path::AttributePath;
use super::table::TableReference;
use crate::error::{QueryError, Result};
use crate::sql::{param, Expr, ExprExt};

/// Lookup key: lowercase `(schema, parent, name)`.
type AttrKey = (String, Option<String>, String);

fn key(schema: &str, parent: Option<&str>, name: &str) -> AttrKey {
    (
        schema.to_ascii_lowercase(),
        parent.map(str::to_ascii_lowercase),
        name.to_ascii_lowercase(),
    )
}

/// A multi-valued collection fetched with a follow-up query.
#[derive(Debug, Clone)]
pub struct Association {
    pub name: String,
    /// Joins from the root, in dependency order.
    pub joins: Vec<JoinDescriptor>,
    pub columns: Vec<AssociationColumn>,
}

#[derive(Debug, Clone)]
pub struct AssociationColumn {
    pub label: String,
    pub table: TableReference,
    pub column: String,
}

/// A complex attribute named without a sub-attribute, e.g. `name` or `emails`.
#[derive(Debug, Clone)]
pub struct ComplexAttribute<'a> {
    pub name: String,
    pub children: Vec<&'a AttributeLocation>,
}

impl<'a> ComplexAttribute<'a> {
    /// The `value` sub-attribute, which stands in for the parent in comparisons.
    pub fn value_child(&self) -> Option<&'a AttributeLocation> {
        self.children
            .iter()
            .copied()
            .find(|c| c.name.eq_ignore_ascii_case("value"))
    }
}

/// Result of resolving a path that may name a complex parent.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    Attribute(&'a AttributeLocation),
    Complex(ComplexAttribute<'a>),
}

/// The attribute mapping table of one resource type.
#[derive(Debug, Clone)]
pub struct ResourceMapping {
    pub name: String,
    pub endpoint: Option<String>,
    pub schema: String,
    pub extensions: Vec<String>,
    pub root: TableReference,
    pub id_column: String,
    pub tenant_column: String,
    restrictions: Vec<Expr>,
    attributes: Vec<AttributeLocation>,
    index: HashMap<AttrKey, usize>,
    associations: Vec<Association>,
}

impl ResourceMapping {
    /// Build the mapping table from a declaration.
    ///
    /// Shape problems (unknown aliases, unknown join names, duplicate
    /// attributes) fail with [`QueryError::InvalidDeclaration`].
    pub fn from_decl(decl: &ResourceDecl) -> Result<Self> {
        let invalid =
            |msg: String| QueryError::InvalidDeclaration(format!("{}: {}", decl.name, msg));

        let root = TableReference::new(&decl.root.table, &decl.root.alias);

        let mut tables: HashMap<&str, TableReference> = HashMap::new();
        tables.insert(&decl.root.alias, root.clone());
        for table in &decl.tables {
            let reference = TableReference::new(&table.table, &table.alias);
            if tables.insert(&table.alias, reference).is_some() {
                return Err(invalid(format!("table alias '{}' declared twice", table.alias)));
            }
        }
        let table = |alias: &str| {
            tables
                .get(alias)
                .cloned()
                .ok_or_else(|| invalid(format!("unknown table alias '{}'", alias)))
        };

        let mut joins: HashMap<&str, JoinDescriptor> = HashMap::new();
        for join in &decl.joins {
            let mut descriptor = JoinDescriptor::new(
                table(&join.source)?,
                &join.source_column,
                table(&join.target)?,
                &join.target_column,
            );
            descriptor.outer = join.outer;
            descriptor.to_many = join.to_many;
            if joins.insert(&join.name, descriptor).is_some() {
                return Err(invalid(format!("join '{}' declared twice", join.name)));
            }
        }
        let chain = |names: &[String]| -> Result<Vec<JoinDescriptor>> {
            names
                .iter()
                .map(|name| {
                    joins
                        .get(name.as_str())
                        .cloned()
                        .ok_or_else(|| invalid(format!("unknown join '{}'", name)))
                })
                .collect()
        };

        let mut attributes = Vec::with_capacity(decl.attributes.len());
        let mut index = HashMap::new();
        for attr in &decl.attributes {
            let schema_uri = attr.schema.clone().unwrap_or_else(|| decl.schema.clone());
            let known_schema = std::iter::once(&decl.schema)
                .chain(&decl.extensions)
                .any(|s| s.eq_ignore_ascii_case(&schema_uri));
            if !known_schema {
                return Err(invalid(format!(
                    "attribute '{}' uses undeclared schema '{}'",
                    attr.name, schema_uri
                )));
            }

            let required_joins = chain(&attr.joins)?;
            let location_table = match &attr.table {
                Some(alias) => table(alias)?,
                None => required_joins
                    .last()
                    .map(|j| j.target.clone())
                    .unwrap_or_else(|| root.clone()),
            };

            let location = AttributeLocation {
                schema_uri,
                parent: attr.parent.clone(),
                name: attr.name.clone(),
                table: location_table,
                column: attr.column.clone(),
                required_joins,
                attr_type: attr.attr_type,
                case_exact: attr.case_exact,
            };

            let k = key(&location.schema_uri, location.parent.as_deref(), &location.name);
            if index.insert(k, attributes.len()).is_some() {
                return Err(invalid(format!(
                    "attribute '{}' declared twice",
                    location.qualified_name()
                )));
            }
            attributes.push(location);
        }

        let mut restrictions = Vec::with_capacity(decl.restrictions.len());
        for restriction in &decl.restrictions {
            let column = root.column(&restriction.column);
            let expr = match (restriction.op, &restriction.value) {
                (RestrictionOp::IsNull, _) => column.is_null(),
                (RestrictionOp::IsNotNull, _) => column.is_not_null(),
                (RestrictionOp::Eq, Some(value)) => column.eq(param(value.clone())),
                (RestrictionOp::Eq, None) => {
                    return Err(invalid(format!(
                        "restriction on '{}' needs a value",
                        restriction.column
                    )))
                }
            };
            restrictions.push(expr);
        }

        let mut associations = Vec::with_capacity(decl.associations.len());
        for assoc in &decl.associations {
            let columns = assoc
                .columns
                .iter()
                .map(|c| {
                    Ok(AssociationColumn {
                        label: c.label.clone(),
                        table: table(&c.table)?,
                        column: c.column.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            associations.push(Association {
                name: assoc.name.clone(),
                joins: chain(&assoc.joins)?,
                columns,
            });
        }

        Ok(Self {
            name: decl.name.clone(),
            endpoint: decl.endpoint.clone(),
            schema: decl.schema.clone(),
            extensions: decl.extensions.clone(),
            root,
            id_column: decl.id_column.clone(),
            tenant_column: decl.tenant_column.clone(),
            restrictions,
            attributes,
            index,
            associations,
        })
    }

    /// Look up an attribute by its `(schema, parent, name)` triple.
    ///
    /// Without a schema the core schema is searched first, then the
    /// extensions in declaration order.
    pub fn resolve(
        &self,
        schema_uri: Option<&str>,
        parent: Option<&str>,
        name: &str,
    ) -> Result<&AttributeLocation> {
        let found = match schema_uri {
            Some(schema) => self.index.get(&key(schema, parent, name)),
            None => self
                .schemas()
                .find_map(|schema| self.index.get(&key(schema, parent, name))),
        };
        match found {
            Some(&idx) => Ok(&self.attributes[idx]),
            None => {
                let mut path = AttributePath::new(parent, name);
                path.schema = schema_uri.map(str::to_string);
                Err(QueryError::unknown_attribute(path.to_string()))
            }
        }
    }

    /// Resolve a parsed path, allowing a bare complex parent.
    pub fn resolve_path(&self, path: &AttributePath) -> Result<Resolved<'_>> {
        let err = match self.resolve(path.schema.as_deref(), path.parent.as_deref(), &path.name) {
            Ok(location) => return Ok(Resolved::Attribute(location)),
            Err(err) => err,
        };
        if path.parent.is_some() {
            return Err(err);
        }

        let schemas: Vec<&str> = match &path.schema {
            Some(schema) => vec![schema.as_str()],
            None => self.schemas().collect(),
        };
        for schema in schemas {
            let children: Vec<&AttributeLocation> = self
                .attributes
                .iter()
                .filter(|a| {
                    a.schema_uri.eq_ignore_ascii_case(schema)
                        && a.parent
                            .as_deref()
                            .is_some_and(|p| p.eq_ignore_ascii_case(&path.name))
                })
                .collect();
            if !children.is_empty() {
                return Ok(Resolved::Complex(ComplexAttribute {
                    name: path.name.clone(),
                    children,
                }));
            }
        }
        Err(err)
    }

    fn schemas(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.schema.as_str()).chain(self.extensions.iter().map(String::as_str))
    }

    pub fn attributes(&self) -> &[AttributeLocation] {
        &self.attributes
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Static predicates on the root table.
    pub fn restrictions(&self) -> &[Expr] {
        &self.restrictions
    }

    pub fn id_expr(&self) -> Expr {
        self.root.column(&self.id_column)
    }

    /// Result label for an attribute: relative for the core schema, qualified otherwise.
    pub fn label(&self, location: &AttributeLocation) -> String {
        if location.schema_uri.eq_ignore_ascii_case(&self.schema) {
            location.full_name()
        } else {
            location.qualified_name()
        }
    }

    /// Whether the attribute is the root identifier itself.
    pub fn is_id(&self, location: &AttributeLocation) -> bool {
        location.table == self.root && location.column.eq_ignore_ascii_case(&self.id_column)
    }

    /// Verify every declaration resolves and every join chain linearizes.
    pub fn self_check(&self) -> Result<()> {
        let mut all = JoinSet::new();

        for location in &self.attributes {
            let resolved = self.resolve(
                Some(&location.schema_uri),
                location.parent.as_deref(),
                &location.name,
            )?;
            if !std::ptr::eq(resolved, location) {
                return Err(QueryError::InvalidDeclaration(format!(
                    "{}: '{}' resolves to a different declaration",
                    self.name,
                    location.qualified_name()
                )));
            }

            let ordered = linearize(&self.root, &location.required_joins)?;
            if ordered != location.required_joins {
                return Err(QueryError::inconsistent_joins(
                    &self.root.alias,
                    format!(
                        "join chain of '{}' is not in dependency order",
                        location.qualified_name()
                    ),
                ));
            }
            self.check_reachable(&location.table, &ordered, &location.qualified_name())?;
            all.extend(&ordered);
        }

        linearize(&self.root, &all)?;

        for assoc in &self.associations {
            let ordered = linearize(&self.root, &assoc.joins)?;
            for column in &assoc.columns {
                self.check_reachable(&column.table, &ordered, &assoc.name)?;
            }
        }

        Ok(())
    }

    fn check_reachable(
        &self,
        table: &TableReference,
        joins: &[JoinDescriptor],
        what: &str,
    ) -> Result<()> {
        if *table == self.root || joins.iter().any(|j| j.target == *table) {
            return Ok(());
        }
        Err(QueryError::inconsistent_joins(
            &self.root.alias,
            format!("'{}' reads from {} which its joins never introduce", what, table),
        ))
    }
}

/// All registered resource types. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: Vec<ResourceMapping>,
}

impl ResourceRegistry {
    /// Register resource mappings, running the self-check on each.
    pub fn new(resources: Vec<ResourceMapping>) -> Result<Self> {
        for (i, resource) in resources.iter().enumerate() {
            if resources[..i]
                .iter()
                .any(|r| r.name.eq_ignore_ascii_case(&resource.name))
            {
                return Err(QueryError::InvalidDeclaration(format!(
                    "resource type '{}' registered twice",
                    resource.name
                )));
            }
            resource.self_check()?;
        }

        let attributes: usize = resources.iter().map(|r| r.attributes.len()).sum();
        tracing::info!(
            resources = resources.len(),
            attributes,
            "Resource registry self-check passed"
        );
        Ok(Self { resources })
    }

    pub fn from_decl(catalog: &CatalogDecl) -> Result<Self> {
        let resources = catalog
            .resources
            .iter()
            .map(ResourceMapping::from_decl)
            .collect::<Result<Vec<_>>>()?;
        Self::new(resources)
    }

    /// Find a resource type by name or endpoint, ignoring case.
    pub fn get(&self, name: &str) -> Result<&ResourceMapping> {
        let endpoint = name.trim_start_matches('/');
        self.resources
            .iter()
            .find(|r| {
                r.name.eq_ignore_ascii_case(name)
                    || r.endpoint
                        .as_deref()
                        .is_some_and(|e| e.trim_start_matches('/').eq_ignore_ascii_case(endpoint))
            })
            .ok_or_else(|| QueryError::UnknownResourceType(name.to_string()))
    }

    pub fn resolve(
        &self,
        resource: &str,
        schema_uri: Option<&str>,
        parent: Option<&str>,
        name: &str,
    ) -> Result<&AttributeLocation> {
        self.get(resource)?.resolve(schema_uri, parent, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceMapping> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
