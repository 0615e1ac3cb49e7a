#[allow(dead_code)]
mod fixture;

use std::collections::HashSet;

use fixture::*;
use rusqlite::Connection;
use scimql::catalog;
use scimql::config::QuerySettings;
use scimql::executor::{QueryExecutor, SqliteExecutor};
use scimql::filter::attr;
use scimql::sql::{BoundSql, Dialect, SqlValue};
use scimql::{QueryEngine, QueryRequest, QueryResult};

/// Delegates to SQLite and records which statements ran.
struct Recording<'c> {
    inner: SqliteExecutor<'c>,
    counts: usize,
    row_fetches: usize,
    follow_ups: usize,
}

impl<'c> Recording<'c> {
    fn new(conn: &'c Connection) -> Self {
        Self {
            inner: SqliteExecutor::new(conn),
            counts: 0,
            row_fetches: 0,
            follow_ups: 0,
        }
    }
}

impl QueryExecutor for Recording<'_> {
    type Error = rusqlite::Error;

    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn count(&mut self, statement: &BoundSql) -> Result<u64, Self::Error> {
        self.counts += 1;
        self.inner.count(statement)
    }

    fn rows(&mut self, statement: &BoundSql) -> Result<Vec<Vec<SqlValue>>, Self::Error> {
        self.row_fetches += 1;
        self.inner.rows(statement)
    }

    fn association_rows(
        &mut self,
        statement: &BoundSql,
    ) -> Result<Vec<Vec<SqlValue>>, Self::Error> {
        self.follow_ups += 1;
        self.inner.association_rows(statement)
    }
}

/// Seven users, each with two email addresses so joined rows multiply.
fn seven_users() -> Connection {
    let conn = empty_db();
    for i in 1..=7 {
        let id = format!("u{}", i);
        add_user(&conn, &id, &format!("user{}", i), Some(format!("Family{}", 8 - i).as_str()));
        add_email(&conn, &id, &format!("user{}@test.de", i), "work", true);
        add_email(&conn, &id, &format!("user{}@example.org", i), "home", false);
    }
    conn
}

fn run<'c>(conn: &'c Connection, request: &QueryRequest) -> (QueryResult, Recording<'c>) {
    let registry = catalog::keycloak().unwrap();
    let engine = QueryEngine::new(&registry, QuerySettings::default());
    let mut executor = Recording::new(conn);
    let result = engine.query(&mut executor, request).unwrap();
    (result, executor)
}

fn request() -> QueryRequest {
    QueryRequest::new("User", REALM)
        .filter(attr("emails.value").co("@"))
        .sort_by("name.familyName")
}

#[test]
fn test_pages_cover_every_entity_once() {
    let conn = seven_users();

    for count in 1..=4 {
        let mut seen = Vec::new();
        let mut start = 1;
        loop {
            let (page, _) = run(&conn, &request().page(start, Some(count)));
            assert_eq!(page.total_results, 7, "count={} start={}", count, start);
            seen.extend(page.rows.iter().map(|r| r.id.to_string()));
            if (page.rows.len() as i64) < count {
                break;
            }
            start += count;
        }

        let unique: HashSet<&String> = seen.iter().collect();
        assert_eq!(seen.len(), 7, "count={}: {:?}", count, seen);
        assert_eq!(unique.len(), 7);
    }
}

#[test]
fn test_sorted_pages_follow_sort_order() {
    let conn = seven_users();
    let (first, _) = run(&conn, &request().page(1, Some(3)));
    let (second, _) = run(&conn, &request().page(4, Some(3)));

    let ids: Vec<String> = first
        .rows
        .iter()
        .chain(second.rows.iter())
        .map(|r| r.id.to_string())
        .collect();
    // Family names run backwards from the user number
    assert_eq!(ids, vec!["u7", "u6", "u5", "u4", "u3", "u2"]);
}

#[test]
fn test_count_zero_returns_total_only() {
    let conn = seven_users();
    let (result, executor) = run(&conn, &request().page(1, Some(0)));

    assert_eq!(result.total_results, 7);
    assert!(result.rows.is_empty());
    assert_eq!(result.items_per_page, 0);
    assert_eq!(executor.counts, 1);
    assert_eq!(executor.row_fetches, 0);
    assert_eq!(executor.follow_ups, 0);
}

#[test]
fn test_start_index_past_last_page() {
    let conn = seven_users();
    let (result, executor) = run(&conn, &request().page(8, Some(5)));

    assert_eq!(result.total_results, 7);
    assert!(result.rows.is_empty());
    assert_eq!(result.start_index, 8);
    assert_eq!(executor.row_fetches, 0);
}

#[test]
fn test_last_partial_page() {
    let conn = seven_users();
    let (result, executor) = run(&conn, &request().page(6, Some(5)));

    assert_eq!(result.total_results, 7);
    assert_eq!(result.items_per_page, 2);
    assert_eq!(executor.row_fetches, 1);
    // one follow-up per declared User association
    assert_eq!(executor.follow_ups, 9);
    for row in &result.rows {
        assert_eq!(row.collection("emails").len(), 2);
    }
}

#[test]
fn test_no_match_skips_everything_after_count() {
    let conn = seven_users();
    let (result, executor) = run(
        &conn,
        &QueryRequest::new("User", REALM).filter(attr("userName").eq("nobody")),
    );

    assert_eq!(result.total_results, 0);
    assert_eq!(executor.counts, 1);
    assert_eq!(executor.row_fetches, 0);
    assert_eq!(executor.follow_ups, 0);
}

#[test]
fn test_start_index_below_one_is_first_page() {
    let conn = seven_users();
    let (result, _) = run(&conn, &request().page(-3, Some(2)));
    assert_eq!(result.start_index, 1);
    assert_eq!(result.rows[0].id, SqlValue::Text("u7".into()));
}

#[test]
fn test_count_is_clamped_to_max_results() {
    let conn = seven_users();
    let registry = catalog::keycloak().unwrap();
    let settings = QuerySettings {
        default_count: 2,
        max_results: 4,
        ..QuerySettings::default()
    };
    let engine = QueryEngine::new(&registry, settings);
    let mut executor = SqliteExecutor::new(&conn);

    let result = engine.query(&mut executor, &request()).unwrap();
    assert_eq!(result.items_per_page, 2);

    let result = engine
        .query(&mut executor, &request().page(1, Some(100)))
        .unwrap();
    assert_eq!(result.items_per_page, 4);
    assert_eq!(result.total_results, 7);
}
