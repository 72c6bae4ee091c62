//! Connection settings for the hosted product table

use crate::error::{Result, SyncError};

pub const DEFAULT_TABLE: &str = "Products";
pub const DEFAULT_ID_COLUMN: &str = "id";
pub const DEFAULT_SKU_COLUMN: &str = "sku";

/// Endpoint, credential and table layout of the product store
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project URL, without trailing slash (e.g. "https://xyz.supabase.co")
    pub url: String,
    /// API key sent as `apikey` and bearer token
    pub key: String,
    pub table: String,
    /// Non-default Postgres schema, sent as Accept-Profile/Content-Profile
    pub schema: Option<String>,
    pub id_column: String,
    pub sku_column: String,
}

impl StoreConfig {
    /// Validate endpoint and credential, using default table layout
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let url = url.into().trim().trim_end_matches('/').to_string();
        let key = key.into().trim().to_string();

        if url.is_empty() {
            return Err(SyncError::Config("store URL is empty (set SUPABASE_URL)".into()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "store URL must start with http:// or https://, got '{}'",
                url
            )));
        }
        if key.is_empty() {
            return Err(SyncError::Config("API key is empty (set SUPABASE_KEY)".into()));
        }

        Ok(Self {
            url,
            key,
            table: DEFAULT_TABLE.to_string(),
            schema: None,
            id_column: DEFAULT_ID_COLUMN.to_string(),
            sku_column: DEFAULT_SKU_COLUMN.to_string(),
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_schema(mut self, schema: Option<String>) -> Self {
        self.schema = schema.filter(|s| !s.trim().is_empty());
        self
    }

    /// Remote identifier and SKU column names
    pub fn with_columns(mut self, id_column: impl Into<String>, sku_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self.sku_column = sku_column.into();
        self
    }

    /// `{url}/rest/v1/{table}`
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, self.table)
    }
}

// Keep the key out of debug output and logs
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("table", &self.table)
            .field("schema", &self.schema)
            .field("id_column", &self.id_column)
            .field("sku_column", &self.sku_column)
            .finish()
    }
}
