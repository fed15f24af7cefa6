use crate::domain::ports::{Filter, Query, Table, TableStore};
use crate::error::{Result, StoreError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

const REST_PATH: &str = "rest/v1";

/// `TableStore` over a PostgREST endpoint such as a hosted backend-as-a-service.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, table: Table) -> String {
        format!("{}/{REST_PATH}/{table}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows(response: Response) -> Result<Vec<Value>> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %message, "backend request failed");
            return Err(StoreError::BackendError {
                status: status.as_u16(),
                message,
            });
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&text)? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            row => Ok(vec![row]),
        }
    }
}

fn filter_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn filter_param(filter: &Filter) -> (String, String) {
    (filter.column.clone(), format!("eq.{}", filter_value(&filter.value)))
}

fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(filter_param));
    if let Some((column, ascending)) = &query.order_by {
        let direction = if *ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{column}.{direction}")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

#[async_trait]
impl TableStore for RestBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        debug!(%table, ?query, "select");
        let response = self
            .authorize(self.client.get(self.url(table)))
            .query(&query_params(query))
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        debug!(%table, count = rows.len(), "insert");
        let response = self
            .authorize(self.client.post(self.url(table)))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        debug!(%table, column = %filter.column, "update");
        let response = self
            .authorize(self.client.patch(self.url(table)))
            .query(&[filter_param(filter)])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn upsert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        debug!(%table, count = rows.len(), "upsert");
        let response = self
            .authorize(self.client.post(self.url(table)))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<()> {
        debug!(%table, column = %filter.column, "delete");
        let response = self
            .authorize(self.client.delete(self.url(table)))
            .query(&[filter_param(filter)])
            .send()
            .await?;
        Self::rows(response).await.map(|_| ())
    }
}
