//! Folding raw rows into root entities.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::sql::SqlValue;

/// One root entity with its single-valued attributes and loaded collections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub id: SqlValue,
    pub attributes: BTreeMap<String, SqlValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub collections: BTreeMap<String, Vec<BTreeMap<String, SqlValue>>>,
}

impl ResultRow {
    fn new(id: SqlValue) -> Self {
        Self {
            id,
            attributes: BTreeMap::new(),
            collections: BTreeMap::new(),
        }
    }

    pub fn get(&self, label: &str) -> Option<&SqlValue> {
        self.attributes.get(label)
    }

    pub fn collection(&self, name: &str) -> &[BTreeMap<String, SqlValue>] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Groups raw rows by root id, keeping first-seen order.
#[derive(Debug, Default)]
pub struct ResultMapper {
    rows: Vec<ResultRow>,
    by_id: HashMap<String, usize>,
}

impl ResultMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a row plan tuple. Column 0 is the root id, the rest line up with
    /// `labels[1..]`. Null values are left out.
    pub fn push_row(&mut self, labels: &[String], values: Vec<SqlValue>) {
        let mut values = values.into_iter();
        let Some(id) = values.next() else {
            return;
        };
        let idx = self.entry(id);
        let row = &mut self.rows[idx];
        for (label, value) in labels.iter().skip(1).zip(values) {
            if value.is_null() {
                continue;
            }
            row.attributes.entry(label.clone()).or_insert(value);
        }
    }

    /// Append a follow-up tuple `(root id, columns...)` to a collection.
    ///
    /// Rows for ids outside the page and all-null or repeated members are ignored.
    pub fn push_association(&mut self, name: &str, labels: &[String], values: Vec<SqlValue>) {
        let mut values = values.into_iter();
        let Some(id) = values.next() else {
            return;
        };
        let Some(&idx) = self.by_id.get(&id.to_string()) else {
            return;
        };

        let member: BTreeMap<String, SqlValue> = labels
            .iter()
            .cloned()
            .zip(values)
            .filter(|(_, v)| !v.is_null())
            .collect();
        if member.is_empty() {
            return;
        }

        let collection = self.rows[idx]
            .collections
            .entry(name.to_string())
            .or_default();
        if !collection.contains(&member) {
            collection.push(member);
        }
    }

    /// Root ids in page order.
    pub fn ids(&self) -> Vec<SqlValue> {
        self.rows.iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn finish(self) -> Vec<ResultRow> {
        self.rows
    }

    fn entry(&mut self, id: SqlValue) -> usize {
        let key = id.to_string();
        if let Some(&idx) = self.by_id.get(&key) {
            return idx;
        }
        self.rows.push(ResultRow::new(id));
        self.by_id.insert(key, self.rows.len() - 1);
        self.rows.len() - 1
    }
}
