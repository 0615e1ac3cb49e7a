//! SQLite implementation of [`QueryExecutor`].

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use super::QueryExecutor;
use crate::sql::{BoundSql, Dialect, SqlValue};

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Bool(b) => ToSqlOutput::Owned(Value::Integer(i64::from(*b))),
            SqlValue::Int(n) => ToSqlOutput::Owned(Value::Integer(*n)),
            SqlValue::Float(x) => ToSqlOutput::Owned(Value::Real(*x)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

fn from_sqlite(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(n) => SqlValue::Int(n),
        ValueRef::Real(x) => SqlValue::Float(x),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Runs plans on a borrowed SQLite connection.
pub struct SqliteExecutor<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteExecutor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn fetch(&self, statement: &BoundSql) -> rusqlite::Result<Vec<Vec<SqlValue>>> {
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut tuple = Vec::with_capacity(width);
            for i in 0..width {
                tuple.push(from_sqlite(row.get_ref(i)?));
            }
            out.push(tuple);
        }
        Ok(out)
    }
}

impl QueryExecutor for SqliteExecutor<'_> {
    type Error = rusqlite::Error;

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn count(&mut self, statement: &BoundSql) -> Result<u64, Self::Error> {
        let n: i64 = self.conn.query_row(
            &statement.sql,
            params_from_iter(statement.params.iter()),
            |row| row.get(0),
        )?;
        Ok(n.max(0) as u64)
    }

    fn rows(&mut self, statement: &BoundSql) -> Result<Vec<Vec<SqlValue>>, Self::Error> {
        self.fetch(statement)
    }

    fn association_rows(
        &mut self,
        statement: &BoundSql,
    ) -> Result<Vec<Vec<SqlValue>>, Self::Error> {
        self.fetch(statement)
    }
}
