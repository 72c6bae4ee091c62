//! PostgREST client for a Supabase-hosted product table

use async_trait::async_trait;
use log::{debug, info};
use serde_json::Value;

use super::models::{Identifier, PreorderFields, RemoteRecord};
use super::operations::Operation;
use super::query::Filter;
use super::resilience::{ResilienceConfig, RetryPolicy};
use super::store::{MAX_IDS_PER_REQUEST, ProductStore};
use crate::config::StoreConfig;
use crate::error::{Result, SyncError};

const USER_AGENT: &str = concat!("preorder-sync/", env!("CARGO_PKG_VERSION"));

pub struct SupabaseStore {
    http: reqwest::Client,
    config: StoreConfig,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl SupabaseStore {
    pub fn new(config: StoreConfig, resilience: ResilienceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(resilience.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            retry: RetryPolicy::new(resilience.retry),
            chunk_size: MAX_IDS_PER_REQUEST,
        })
    }

    /// Maximum identifiers per read or write request
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Execute an operation with retries, returning the decoded JSON body
    /// (`Null` for empty bodies, as with `Prefer: return=minimal`)
    pub async fn execute(&self, operation: &Operation) -> Result<Value> {
        let label = operation.describe();
        self.retry
            .execute(&label, || self.send(operation, &label))
            .await
    }

    async fn send(&self, operation: &Operation, label: &str) -> Result<Value> {
        let url = self.config.table_url();
        let query = operation.query_pairs();
        debug!("{} {} {:?}", operation.http_method(), url, query);

        let mut request = self
            .http
            .request(operation.http_method(), &url)
            .query(&query)
            .header("apikey", &self.config.key)
            .bearer_auth(&self.config.key);

        if let Some(prefer) = operation.prefer() {
            request = request.header("Prefer", prefer);
        }
        if let Some(schema) = &self.config.schema {
            let header = match operation {
                Operation::Select { .. } => "Accept-Profile",
                Operation::Update { .. } => "Content-Profile",
            };
            request = request.header(header, schema);
        }
        if let Some(body) = operation.body() {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::from_transport(label, &e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::from_transport(label, &e))?;

        if !status.is_success() {
            return Err(SyncError::from_status(
                label,
                status.as_u16(),
                extract_error_message(&text),
            ));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| SyncError::decode(label, format!("invalid JSON response: {}", e)))
    }
}

#[async_trait]
impl ProductStore for SupabaseStore {
    async fn fetch_products(&self, ids: &[Identifier]) -> Result<Vec<RemoteRecord>> {
        let mut records = Vec::new();

        for chunk in ids.chunks(self.chunk_size) {
            let operation = Operation::select(
                &self.config.table,
                [&self.config.id_column, &self.config.sku_column],
                Filter::is_in(&self.config.id_column, chunk.iter()),
            );
            let body = self.execute(&operation).await?;

            let rows = body.as_array().ok_or_else(|| {
                SyncError::decode(operation.describe(), "expected a JSON array of rows")
            })?;
            for row in rows {
                let record =
                    RemoteRecord::from_json(row, &self.config.id_column, &self.config.sku_column)
                        .map_err(|msg| SyncError::decode(operation.describe(), msg))?;
                records.push(record);
            }
        }

        info!(
            "Fetched {} of {} requested products from {}",
            records.len(),
            ids.len(),
            self.config.table
        );
        Ok(records)
    }

    async fn clear_preorder(&self, ids: &[Identifier], fields: &PreorderFields) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let payload = fields.clearing_payload();
        for chunk in ids.chunks(self.chunk_size) {
            let operation = Operation::update(
                &self.config.table,
                Filter::for_identifiers(&self.config.id_column, chunk),
                payload.clone(),
            );
            self.execute(&operation).await?;
            debug!("Cleared preorder fields on {} product(s)", chunk.len());
        }
        Ok(())
    }
}

/// Pull a readable message out of a PostgREST or gateway error body
fn extract_error_message(body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        let message = obj
            .get("message")
            .or_else(|| obj.get("error"))
            .or_else(|| obj.get("msg"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return match obj.get("hint").and_then(Value::as_str) {
                Some(hint) if !hint.is_empty() => format!("{} (hint: {})", message, hint),
                _ => message.to_string(),
            };
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
