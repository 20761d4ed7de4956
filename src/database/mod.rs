//! Capability boundary to the external tabular data platform.
//!
//! Every query the engine issues is an equality / `in(...)` filter over a single
//! table, optionally projected, ordered and limited. Rows cross this boundary as
//! JSON and must be decoded into typed records with [`decode_rows`] right away.

pub mod clients;
pub mod memory;
pub mod postgrest;
pub mod tables;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq { column: String, value: String },
    In { column: String, values: Vec<String> },
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_in<I, V>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        Filter::In {
            column: column.to_string(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Query {
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.columns = Some(columns.to_string());
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn is_in<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.filters.push(Filter::is_in(column, values));
        self
    }

    pub fn order_by(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Whether a write should echo the written rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    Minimal,
    Representation,
}

/// How an upsert resolves a unique-key conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    MergeDuplicates,
    IgnoreDuplicates,
}

#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<JsonValue>>;

    async fn insert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        returning: Returning,
    ) -> Result<Vec<JsonValue>>;

    async fn update(&self, table: &str, filters: &[Filter], patch: JsonValue) -> Result<()>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()>;

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        on_conflict: &[&str],
        resolution: Resolution,
        returning: Returning,
    ) -> Result<Vec<JsonValue>>;
}

pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<JsonValue>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|source| Error::Decode {
                table: table.to_string(),
                source,
            })
        })
        .collect()
}

/// Selects and decodes in one step.
pub async fn fetch<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: &str,
    query: &Query,
) -> Result<Vec<T>> {
    let rows = store.select(table, query).await?;
    decode_rows(table, rows)
}

pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn TableStore,
    table: &str,
    query: &Query,
) -> Result<Option<T>> {
    Ok(fetch(store, table, query).await?.into_iter().next())
}

/// Text form of a JSON scalar as it appears in a filter expression.
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}
