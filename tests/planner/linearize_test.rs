use scimql::catalog;
use scimql::error::QueryError;
use scimql::mapping::{linearize, JoinDescriptor, JoinSet, TableReference};

fn table(alias: &str) -> TableReference {
    TableReference::new(format!("T_{}", alias.to_uppercase()), alias)
}

fn join(source: &str, target: &str) -> JoinDescriptor {
    JoinDescriptor::new(table(source), "ID", table(target), format!("{}_ID", source.to_uppercase()))
}

fn targets(joins: &[JoinDescriptor]) -> Vec<&str> {
    joins.iter().map(|j| j.target.alias.as_str()).collect()
}

#[test]
fn test_dependent_joins_are_reordered() {
    let root = table("a");
    let ordered = linearize(&root, &[join("b", "c"), join("a", "b")]).unwrap();
    assert_eq!(ordered, vec![join("a", "b"), join("b", "c")]);
}

#[test]
fn test_unreachable_join_is_rejected() {
    let root = table("a");
    let err = linearize(&root, &[join("a", "b"), join("c", "d")]).unwrap_err();
    match err {
        QueryError::InconsistentJoinGraph { root, reason } => {
            assert_eq!(root, "a");
            assert!(reason.contains("'c'"), "{}", reason);
            assert!(reason.contains("never introduced"), "{}", reason);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_cycle_is_rejected() {
    let root = table("a");
    let err = linearize(&root, &[join("a", "b"), join("c", "d"), join("d", "c")]).unwrap_err();
    assert!(err.to_string().contains("cycle between aliases c, d"), "{}", err);
}

#[test]
fn test_alias_introduced_twice_is_rejected() {
    let root = table("a");
    let mut other = join("a", "c");
    other.target = TableReference::new("T_OTHER", "c");
    let err = linearize(&root, &[join("a", "b"), join("b", "c"), other]).unwrap_err();
    assert!(err.to_string().contains("alias 'c' introduced by both"), "{}", err);
}

#[test]
fn test_root_alias_cannot_be_target() {
    let root = table("a");
    let err = linearize(&root, &[join("b", "a"), join("a", "b")]).unwrap_err();
    assert!(err.to_string().contains("re-introduces the root alias"), "{}", err);
}

#[test]
fn test_linearization_is_idempotent() {
    let root = table("a");
    let joins = vec![
        join("c", "e"),
        join("a", "b"),
        join("b", "d"),
        join("a", "c"),
    ];

    let once = linearize(&root, &joins).unwrap();
    let twice = linearize(&root, &once).unwrap();
    assert_eq!(once, twice);

    let mut reversed = joins.clone();
    reversed.reverse();
    let other = linearize(&root, &reversed).unwrap();

    // Every join comes after the join introducing its source, whatever the input order.
    for ordered in [&once, &other] {
        let position = |alias: &str| ordered.iter().position(|j| j.target.alias == alias);
        for j in ordered.iter() {
            if j.source.alias != "a" {
                assert!(position(&j.source.alias) < position(&j.target.alias));
            }
        }
    }
    assert_eq!(targets(&once), vec!["b", "d", "c", "e"]);
}

#[test]
fn test_outer_and_cardinality_do_not_affect_identity() {
    let root = table("a");
    let mut set = JoinSet::new();
    assert!(set.insert(join("a", "b")));
    assert!(!set.insert(join("a", "b").outer().to_many()));
    let ordered = linearize(&root, &set).unwrap();
    assert_eq!(ordered.len(), 1);
}

#[test]
fn test_union_of_catalog_joins_has_no_duplicates() {
    let registry = catalog::keycloak().unwrap();
    for resource in registry.iter() {
        let mut set = JoinSet::new();
        for location in resource.attributes() {
            set.extend(&location.required_joins);
        }
        let ordered = linearize(&resource.root, &set).unwrap();
        let mut aliases = targets(&ordered);
        let before = aliases.len();
        aliases.sort_unstable();
        aliases.dedup();
        assert_eq!(aliases.len(), before, "{}", resource.name);
    }
}
