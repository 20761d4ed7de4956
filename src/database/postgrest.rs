use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value as JsonValue;
use url::Url;

use super::{Filter, Query, Resolution, Returning, TableStore};
use crate::error::{Error, Result};

/// Header pair a privilege tier authenticates with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub bearer: String,
}

/// [`TableStore`] over a PostgREST endpoint (`{base}/rest/v1`).
#[derive(Clone)]
pub struct PostgrestClient {
    http: Client,
    rest_url: String,
    credentials: Credentials,
}

impl PostgrestClient {
    pub fn new(http: Client, rest_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            rest_url: rest_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    pub fn build_url(&self, table: &str, params: Vec<(String, String)>) -> Result<Url> {
        let base = format!("{}/{}", self.rest_url, table);
        let parsed = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        };
        parsed.map_err(|e| Error::Config(format!("Invalid data endpoint {}: {}", base, e)))
    }

    async fn send(&self, req: RequestBuilder, method: &str, table: &str) -> Result<Response> {
        let resp = req
            .header("apikey", &self.credentials.api_key)
            .bearer_auth(&self.credentials.bearer)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                table,
                method,
                status = status.as_u16(),
                body = %body,
                "Data platform request failed"
            );
            return Err(Error::Upstream(format!(
                "{} {} returned {}",
                method, table, status
            )));
        }
        Ok(resp)
    }

    async fn written_rows(resp: Response, returning: Returning) -> Result<Vec<JsonValue>> {
        match returning {
            Returning::Representation => Ok(resp.json::<Vec<JsonValue>>().await?),
            Returning::Minimal => Ok(Vec::new()),
        }
    }
}

pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();
    if let Some(columns) = &query.columns {
        params.push(("select".to_string(), columns.clone()));
    }
    params.extend(filter_params(&query.filters));
    if let Some(order) = &query.order {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| match filter {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
            Filter::In { column, values } => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                    .collect();
                (column.clone(), format!("in.({})", quoted.join(",")))
            }
        })
        .collect()
}

fn prefer(resolution: Option<Resolution>, returning: Returning) -> String {
    let returning = match returning {
        Returning::Minimal => "return=minimal",
        Returning::Representation => "return=representation",
    };
    match resolution {
        Some(Resolution::MergeDuplicates) => format!("resolution=merge-duplicates,{}", returning),
        Some(Resolution::IgnoreDuplicates) => format!("resolution=ignore-duplicates,{}", returning),
        None => returning.to_string(),
    }
}

fn require_filters(op: &str, table: &str, filters: &[Filter]) -> Result<()> {
    if filters.is_empty() {
        return Err(Error::Internal(format!(
            "Refusing unfiltered {} on {}",
            op, table
        )));
    }
    Ok(())
}

#[async_trait]
impl TableStore for PostgrestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<JsonValue>> {
        let url = self.build_url(table, query_params(query))?;
        let resp = self.send(self.http.get(url), "GET", table).await?;
        Ok(resp.json::<Vec<JsonValue>>().await?)
    }

    async fn insert(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        returning: Returning,
    ) -> Result<Vec<JsonValue>> {
        let url = self.build_url(table, Vec::new())?;
        let req = self
            .http
            .post(url)
            .header("Prefer", prefer(None, returning))
            .json(&rows);
        let resp = self.send(req, "POST", table).await?;
        Self::written_rows(resp, returning).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: JsonValue) -> Result<()> {
        require_filters("update", table, filters)?;
        let url = self.build_url(table, filter_params(filters))?;
        let req = self
            .http
            .patch(url)
            .header("Prefer", prefer(None, Returning::Minimal))
            .json(&patch);
        self.send(req, "PATCH", table).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        require_filters("delete", table, filters)?;
        let url = self.build_url(table, filter_params(filters))?;
        self.send(self.http.delete(url), "DELETE", table).await?;
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
        let url = self.build_url(
            table,
            vec![("on_conflict".to_string(), on_conflict.join(","))],
        )?;
        let req = self
            .http
            .post(url)
            .header("Prefer", prefer(Some(resolution), returning))
            .json(&rows);
        let resp = self.send(req, "POST", table).await?;
        Self::written_rows(resp, returning).await
    }
}
