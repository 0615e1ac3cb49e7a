use scimql::catalog;
use scimql::error::{ErrorKind, QueryError, ScimErrorType};
use scimql::filter::{attr, not, CompiledFilter, FilterCompiler, FilterNode, FilterValue};
use scimql::mapping::ResourceRegistry;
use scimql::sql::{Dialect, SqlValue};

fn registry() -> ResourceRegistry {
    catalog::keycloak().unwrap()
}

fn compile(resource: &str, node: &FilterNode) -> Result<CompiledFilter, QueryError> {
    let registry = registry();
    let mapping = registry.get(resource)?;
    FilterCompiler::new(mapping).compile(node)
}

fn join_aliases(compiled: &CompiledFilter) -> Vec<String> {
    compiled.joins.iter().map(|j| j.target.alias.clone()).collect()
}

#[test]
fn test_json_tree_compiles_with_numbered_placeholders() {
    let json = r#"{
        "and": [
            {"comparison": {"path": "userName", "op": "sw", "value": "adm"}},
            {"or": [
                {"comparison": {"path": "active", "op": "eq", "value": true}},
                {"not": {"comparison": {"path": "title", "op": "pr"}}}
            ]}
        ]
    }"#;
    let node: FilterNode = serde_json::from_str(json).unwrap();
    let compiled = compile("User", &node).unwrap();

    let bound = compiled.bind(Dialect::Postgres);
    assert_eq!(
        bound.sql,
        "(LOWER(\"u\".\"USERNAME\") LIKE LOWER($1) ESCAPE '!' AND (\"u\".\"ENABLED\" = $2 OR \
         NOT (\"ua\".\"TITLE\" IS NOT NULL AND \"ua\".\"TITLE\" <> '')))"
    );
    assert_eq!(
        bound.params,
        vec![SqlValue::Text("adm%".into()), SqlValue::Bool(true)]
    );
    assert_eq!(join_aliases(&compiled), vec!["ua"]);
}

#[test]
fn test_placeholders_per_dialect() {
    let node = attr("userName").eq("a").and(attr("externalId").eq("b"));
    let compiled = compile("User", &node).unwrap();

    let tsql = compiled.bind(Dialect::TSql).sql;
    assert!(tsql.contains("LOWER([u].[USERNAME]) = LOWER(@P1)"), "{}", tsql);
    assert!(tsql.contains("[ua].[EXTERNAL_ID] = @P2"), "{}", tsql);

    let mysql = compiled.bind(Dialect::MySql).sql;
    assert!(mysql.contains("`ua`.`EXTERNAL_ID` = ?"), "{}", mysql);
    assert_eq!(mysql.matches('?').count(), 2);
}

#[test]
fn test_pattern_operators_escape_user_input() {
    let cases = [
        (attr("userName").co("50%_off!"), "%50!%!_off!!%"),
        (attr("userName").sw("a_b"), "a!_b%"),
        (attr("userName").ew("%"), "%!%"),
        (attr("userName").co("[ab]"), "%![ab!]%"),
    ];
    for (node, pattern) in cases {
        let compiled = compile("User", &node).unwrap();
        assert_eq!(compiled.params(), vec![SqlValue::Text(pattern.into())]);
    }
}

#[test]
fn test_bracket_classes_are_literal_on_tsql() {
    let compiled = compile("User", &attr("userName").co("[ab]")).unwrap();
    let bound = compiled.bind(Dialect::TSql);
    assert_eq!(bound.sql, "LOWER([u].[USERNAME]) LIKE LOWER(@P1) ESCAPE '!'");
    assert_eq!(bound.params, vec![SqlValue::Text("%![ab!]%".into())]);
}

#[test]
fn test_ordering_operators_on_dates() {
    let compiled = compile(
        "User",
        &attr("meta.created")
            .ge("2024-01-01T00:00:00Z")
            .and(attr("meta.created").lt("2024-01-01T01:00:00+01:00")),
    )
    .unwrap();
    let bound = compiled.bind(Dialect::Sqlite);
    assert_eq!(
        bound.sql,
        "(\"u\".\"CREATED_TIMESTAMP\" >= ? AND \"u\".\"CREATED_TIMESTAMP\" < ?)"
    );
    assert_eq!(
        bound.params,
        vec![SqlValue::Int(1_704_067_200_000), SqlValue::Int(1_704_067_200_000)]
    );
}

#[test]
fn test_joins_are_collected_once_in_first_use_order() {
    let node = attr("emails.value")
        .co("@test.de")
        .or(attr("name.familyName").eq("Berg"))
        .or(attr("emails.type").eq("work"))
        .and(attr("groups.display").eq("admins"));
    let compiled = compile("User", &node).unwrap();
    assert_eq!(join_aliases(&compiled), vec!["ua", "ue", "ugm", "g"]);
    assert!(compiled.joins.has_to_many());
}

#[test]
fn test_entity_level_not_keeps_outer_joins_clean() {
    let node = attr("userName")
        .eq("bob")
        .and(not(attr("emails.value").ew("@test.de")));
    let compiled = compile("User", &node).unwrap();

    assert!(compiled.joins.is_empty());
    let sql = compiled.bind(Dialect::Sqlite).sql;
    assert!(sql.contains("\"u\".\"ID\" NOT IN (SELECT"), "{}", sql);
    assert!(sql.contains("FROM \"USER_ENTITY\" AS \"u\""), "{}", sql);
    assert!(sql.starts_with("(LOWER(\"u\".\"USERNAME\") = LOWER(?) AND"), "{}", sql);
    assert!(sql.contains("LOWER(\"ue\".\"EMAIL_VALUE\") LIKE LOWER(?) ESCAPE '!'"), "{}", sql);
}

#[test]
fn test_not_over_single_valued_registers_joins() {
    let compiled = compile("User", &not(attr("name.givenName").eq("x"))).unwrap();
    assert_eq!(join_aliases(&compiled), vec!["ua"]);
    assert_eq!(
        compiled.bind(Dialect::Sqlite).sql,
        "NOT (LOWER(\"ua\".\"GIVEN_NAME\") = LOWER(?))"
    );
}

#[test]
fn test_presence_on_non_textual_column() {
    let compiled = compile("User", &attr("active").pr()).unwrap();
    assert_eq!(compiled.bind(Dialect::Sqlite).sql, "\"u\".\"ENABLED\" IS NOT NULL");
}

#[test]
fn test_group_and_role_filters() {
    let compiled = compile("Group", &attr("members.display").sw("al")).unwrap();
    assert_eq!(join_aliases(&compiled), vec!["ugm", "mu"]);

    let compiled = compile("Role", &attr("name").eq("admin")).unwrap();
    assert!(compiled.joins.is_empty());
    assert_eq!(
        compiled.bind(Dialect::Postgres).sql,
        "LOWER(\"r\".\"NAME\") = LOWER($1)"
    );
}

#[test]
fn test_invalid_values_are_client_errors() {
    let cases = [
        (attr("active").eq("maybe"), "active"),
        (attr("meta.created").gt("yesterday"), "meta.created"),
        (attr("meta.created").co("2024"), "meta.created"),
        (attr("active").gt(true), "active"),
        (attr("userName").lt(FilterValue::Null), "userName"),
    ];
    for (node, expected_path) in cases {
        let err = compile("User", &node).unwrap_err();
        match &err {
            QueryError::InvalidFilterValue { path, .. } => assert_eq!(path, expected_path),
            other => panic!("unexpected error for {}: {}", node, other),
        }
        assert_eq!(err.kind(), ErrorKind::ClientInput);
        assert_eq!(err.scim_type(), Some(ScimErrorType::InvalidValue));
    }
}

#[test]
fn test_unknown_attributes() {
    for path in ["nickname.first", "emails..value", "groups.$ref", "urn:bogus:schema:userName"] {
        let err = compile("User", &attr(path).eq("x")).unwrap_err();
        assert!(
            matches!(err, QueryError::UnknownAttribute { .. }),
            "{}: {}",
            path,
            err
        );
        assert_eq!(err.scim_type(), Some(ScimErrorType::InvalidFilter));
    }
}

#[test]
fn test_string_attributes_accept_scalar_literals() {
    let compiled = compile("User", &attr("externalId").eq(42)).unwrap();
    assert_eq!(compiled.params(), vec![SqlValue::Text("42".into())]);

    let compiled = compile("User", &attr("active").eq("TRUE")).unwrap();
    assert_eq!(compiled.params(), vec![SqlValue::Bool(true)]);
}
