//! In-process [`TableStore`] used by the test suites and local runs without a data platform.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::{render_value, Filter, Query, Resolution, Returning, TableStore};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailMode {
    All,
    Writes,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<JsonValue>>>,
    failures: Mutex<HashMap<String, FailMode>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends rows verbatim, without id assignment.
    pub fn seed(&self, table: &str, rows: Vec<JsonValue>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.entry(table.to_string()).or_default().extend(rows);
        }
    }

    pub fn rows(&self, table: &str) -> Vec<JsonValue> {
        self.tables
            .lock()
            .map(|tables| tables.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Every operation on `table` fails with an upstream error.
    pub fn fail_table(&self, table: &str) {
        self.set_failure(table, FailMode::All);
    }

    /// Reads of `table` succeed, writes fail with an upstream error.
    pub fn fail_writes(&self, table: &str) {
        self.set_failure(table, FailMode::Writes);
    }

    pub fn heal(&self, table: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(table);
        }
    }

    fn set_failure(&self, table: &str, mode: FailMode) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(table.to_string(), mode);
        }
    }

    fn check(&self, table: &str, write: bool) -> Result<()> {
        let failures = self
            .failures
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))?;
        match failures.get(table) {
            Some(FailMode::All) => Err(Error::Upstream(format!("{} is unavailable", table))),
            Some(FailMode::Writes) if write => {
                Err(Error::Upstream(format!("{} rejected the write", table)))
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<JsonValue>>>> {
        self.tables
            .lock()
            .map_err(|_| Error::Internal("memory store lock poisoned".to_string()))
    }
}

fn matches(row: &JsonValue, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| {
        let cell = row
            .get(filter.column())
            .map(render_value)
            .unwrap_or_else(|| "null".to_string());
        match filter {
            Filter::Eq { value, .. } => &cell == value,
            Filter::In { values, .. } => values.contains(&cell),
        }
    })
}

/// Ascending order with nulls sorting after every value.
fn compare_cells(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => render_value(x).cmp(&render_value(y)),
    }
}

fn project(row: &JsonValue, columns: Option<&str>) -> JsonValue {
    let columns = match columns.map(str::trim) {
        None | Some("*") | Some("") => return row.clone(),
        Some(columns) => columns,
    };
    let Some(object) = row.as_object() else {
        return row.clone();
    };
    let mut projected = Map::new();
    for column in columns.split(',').map(str::trim) {
        if let Some(value) = object.get(column) {
            projected.insert(column.to_string(), value.clone());
        }
    }
    JsonValue::Object(projected)
}

fn with_id(mut row: JsonValue) -> JsonValue {
    if let Some(object) = row.as_object_mut() {
        object
            .entry("id")
            .or_insert_with(|| JsonValue::String(Uuid::new_v4().to_string()));
    }
    row
}

fn same_key(existing: &JsonValue, incoming: &JsonValue, on_conflict: &[&str]) -> bool {
    on_conflict.iter().all(|column| {
        match (existing.get(*column), incoming.get(*column)) {
            (Some(a), Some(b)) => render_value(a) == render_value(b),
            _ => false,
        }
    })
}

fn merge(target: &mut JsonValue, patch: &JsonValue) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn echo(rows: Vec<JsonValue>, returning: Returning) -> Vec<JsonValue> {
    match returning {
        Returning::Representation => rows,
        Returning::Minimal => Vec::new(),
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<JsonValue>> {
        self.check(table, false)?;
        let tables = self.lock()?;
        let mut rows: Vec<JsonValue> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, &query.filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_cells(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows
            .iter()
            .map(|row| project(row, query.columns.as_deref()))
            .collect())
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        returning: Returning,
    ) -> Result<Vec<JsonValue>> {
        self.check(table, true)?;
        let mut tables = self.lock()?;
        let stored: Vec<JsonValue> = rows.into_iter().map(with_id).collect();
        tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(echo(stored, returning))
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: JsonValue) -> Result<()> {
        self.check(table, true)?;
        if filters.is_empty() {
            return Err(Error::Internal(format!("Refusing unfiltered update on {}", table)));
        }
        let mut tables = self.lock()?;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches(row, filters)) {
                merge(row, &patch);
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        self.check(table, true)?;
        if filters.is_empty() {
            return Err(Error::Internal(format!("Refusing unfiltered delete on {}", table)));
        }
        let mut tables = self.lock()?;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !matches(row, filters));
        }
        Ok(())
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        on_conflict: &[&str],
        resolution: Resolution,
        returning: Returning,
    ) -> Result<Vec<JsonValue>> {
        self.check(table, true)?;
        let mut tables = self.lock()?;
        let existing = tables.entry(table.to_string()).or_default();
        let mut written = Vec::new();

        for row in rows {
            match existing
                .iter_mut()
                .find(|current| same_key(current, &row, on_conflict))
            {
                Some(current) => {
                    if resolution == Resolution::MergeDuplicates {
                        merge(current, &row);
                        written.push(current.clone());
                    }
                }
                None => {
                    let row = with_id(row);
                    existing.push(row.clone());
                    written.push(row);
                }
            }
        }

        Ok(echo(written, returning))
    }
}
