use scimql::catalog;
use scimql::error::{ErrorKind, QueryError};
use scimql::mapping::{AttributePath, AttributeType, ResourceRegistry, Resolved};

const ENTERPRISE: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// A minimal catalog that individual tests break in one place.
const DEVICES: &str = r#"
[[resources]]
name = "Device"
schema = "urn:example:scim:Device"
root = { table = "DEVICE", alias = "d" }
tenant_column = "REALM_ID"
tables = [
    { table = "DEVICE_OWNER", alias = "o" },
    { table = "USER_ENTITY", alias = "ou" },
]

[[resources.restrictions]]
column = "RETIRED"
op = "eq"
value = false

[[resources.joins]]
name = "owner_link"
source = "d"
source_column = "ID"
target = "o"
target_column = "DEVICE_ID"
outer = true
to_many = true

[[resources.joins]]
name = "owner"
source = "o"
source_column = "USER_ID"
target = "ou"
target_column = "ID"
outer = true

[[resources.attributes]]
name = "id"
column = "ID"
case_exact = true

[[resources.attributes]]
name = "serial"
column = "SERIAL_NO"

[[resources.attributes]]
name = "purchased"
column = "PURCHASED_AT"
type = "date_time"

[[resources.attributes]]
parent = "owners"
name = "display"
column = "USERNAME"
joins = ["owner_link", "owner"]

[[resources.associations]]
name = "owners"
joins = ["owner_link", "owner"]
columns = [{ label = "display", table = "ou", column = "USERNAME" }]
"#;

fn devices(patch: impl FnOnce(&str) -> String) -> Result<ResourceRegistry, QueryError> {
    let decl = catalog::from_toml_str(&patch(DEVICES))?;
    ResourceRegistry::from_decl(&decl)
}

#[test]
fn test_every_catalog_attribute_resolves_by_path() {
    let registry = catalog::keycloak().unwrap();
    for resource in registry.iter() {
        for location in resource.attributes() {
            let qualified = AttributePath::parse(&location.qualified_name()).unwrap();
            match resource.resolve_path(&qualified).unwrap() {
                Resolved::Attribute(found) => assert!(std::ptr::eq(found, location)),
                Resolved::Complex(c) => panic!("{} resolved to parent {}", location, c.name),
            }

            let found = registry
                .resolve(
                    &resource.name,
                    Some(&location.schema_uri.to_uppercase()),
                    location.parent.as_deref(),
                    &location.name.to_lowercase(),
                )
                .unwrap();
            assert!(std::ptr::eq(found, location));
        }
    }

    let user = registry.get("User").unwrap();
    for (parent, table) in [
        ("x509Certificates", "SCIM_CERTIFICATES"),
        ("entitlements", "SCIM_ENTITLEMENTS"),
        ("photos", "SCIM_PHOTOS"),
        ("phoneNumbers", "SCIM_PHONE_NUMBERS"),
        ("ims", "SCIM_IMS"),
        ("roles", "SCIM_PERSON_ROLES"),
    ] {
        for name in ["value", "type", "display", "primary"] {
            let location = user.resolve(None, Some(parent), name).unwrap();
            assert_eq!(location.table.table, table, "{}.{}", parent, name);
            assert!(location.multi_valued(), "{}.{}", parent, name);
        }
        assert!(user.associations().iter().any(|a| a.name == parent), "{}", parent);
    }
    assert_eq!(
        user.resolve(None, Some("photos"), "value").unwrap().attr_type,
        AttributeType::Reference
    );
}

#[test]
fn test_extension_attributes_resolve_relative_and_qualified() {
    let registry = catalog::keycloak().unwrap();
    let user = registry.get("User").unwrap();

    let relative = user.resolve(None, None, "employeeNumber").unwrap();
    let qualified = user.resolve(Some(ENTERPRISE), None, "employeeNumber").unwrap();
    assert!(std::ptr::eq(relative, qualified));
    assert_eq!(relative.column, "EP_EMPLOYEE_NUMBER");
    assert_eq!(
        user.label(relative),
        format!("{}:employeeNumber", ENTERPRISE)
    );

    let manager = user.resolve(None, Some("manager"), "$ref").unwrap();
    assert_eq!(manager.attr_type, AttributeType::Reference);

    let err = user
        .resolve(Some("urn:ietf:params:scim:schemas:core:2.0:User"), None, "employeeNumber")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ClientInput);
}

#[test]
fn test_multi_valued_follows_join_cardinality() {
    let registry = catalog::keycloak().unwrap();
    let user = registry.get("User").unwrap();

    let given = user.resolve(None, Some("name"), "givenName").unwrap();
    assert!(!given.multi_valued());
    assert_eq!(given.table.alias, "ua");

    let email = user.resolve(None, Some("emails"), "value").unwrap();
    assert!(email.multi_valued());
    assert_eq!(email.table.alias, "ue");

    let group = user.resolve(None, Some("groups"), "display").unwrap();
    assert!(group.multi_valued());
    assert_eq!(
        group
            .required_joins
            .iter()
            .map(|j| j.target.alias.as_str())
            .collect::<Vec<_>>(),
        vec!["ugm", "g"]
    );

    let user_name = user.resolve(None, None, "userName").unwrap();
    assert!(user_name.required_joins.is_empty());
    assert!(user_name.folds_case());
}

#[test]
fn test_custom_catalog_loads() {
    let registry = devices(str::to_string).unwrap();
    assert_eq!(registry.len(), 1);

    let device = registry.get("device").unwrap();
    assert_eq!(device.id_column, "ID");
    assert_eq!(device.restrictions().len(), 1);
    assert_eq!(device.associations()[0].columns[0].table.table, "USER_ENTITY");

    let purchased = device.resolve(None, None, "purchased").unwrap();
    assert_eq!(purchased.attr_type, AttributeType::DateTime);
}

#[test]
fn test_unknown_resource_type() {
    let registry = catalog::keycloak().unwrap();
    let err = registry.get("Devices").unwrap_err();
    assert_eq!(err.to_string(), "Unknown resource type: Devices");
    assert_eq!(err.kind(), ErrorKind::ClientInput);
}

#[test]
fn test_attribute_outside_its_chain_fails_self_check() {
    let err = devices(|s| {
        s.replace(
            "name = \"serial\"\ncolumn = \"SERIAL_NO\"",
            "name = \"serial\"\ntable = \"ou\"\ncolumn = \"SERIAL_NO\"",
        )
    })
    .unwrap_err();
    assert!(matches!(err, QueryError::InconsistentJoinGraph { .. }), "{}", err);
    assert!(err.to_string().contains("never introduce"), "{}", err);
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn test_chain_out_of_order_fails_self_check() {
    let err = devices(|s| {
        s.replace(
            "joins = [\"owner_link\", \"owner\"]\n\n[[resources.associations]]",
            "joins = [\"owner\", \"owner_link\"]\n\n[[resources.associations]]",
        )
    })
    .unwrap_err();
    assert!(err.to_string().contains("not in dependency order"), "{}", err);
}

#[test]
fn test_association_must_be_reachable() {
    let err = devices(|s| {
        s.replace(
            "joins = [\"owner_link\", \"owner\"]\ncolumns",
            "joins = [\"owner_link\"]\ncolumns",
        )
    })
    .unwrap_err();
    assert!(err.to_string().contains("'owners' reads from USER_ENTITY ou"), "{}", err);
}

#[test]
fn test_declaration_shape_errors() {
    let cases: Vec<(&str, &str, &str)> = vec![
        (
            "{ table = \"DEVICE_OWNER\", alias = \"o\" }",
            "{ table = \"DEVICE_OWNER\", alias = \"d\" }",
            "table alias 'd' declared twice",
        ),
        ("target = \"ou\"", "target = \"x\"", "unknown table alias 'x'"),
        ("value = false\n", "\n", "restriction on 'RETIRED' needs a value"),
        (
            "name = \"purchased\"",
            "schema = \"urn:example:other\"\nname = \"purchased\"",
            "undeclared schema 'urn:example:other'",
        ),
        ("name = \"serial\"", "name = \"id\"", "declared twice"),
    ];

    for (from, to, expected) in cases {
        let err = devices(|s| s.replacen(from, to, 1)).unwrap_err();
        assert!(matches!(err, QueryError::InvalidDeclaration(_)), "{}", err);
        assert!(err.to_string().contains(expected), "{} vs {}", err, expected);
    }
}

#[test]
fn test_duplicate_resource_type() {
    let twice = format!("{}\n{}", DEVICES, DEVICES);
    let decl = catalog::from_toml_str(&twice).unwrap();
    let err = ResourceRegistry::from_decl(&decl).unwrap_err();
    assert!(err.to_string().contains("registered twice"), "{}", err);
}
