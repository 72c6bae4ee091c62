//! The contract the reconciler needs from a product table

use async_trait::async_trait;

use super::models::{Identifier, PreorderFields, RemoteRecord};
use crate::error::Result;

/// Upper bound on identifiers per request. Supabase caps responses at 1000
/// rows by default, and longer `in.(…)` filters overrun gateway URL limits.
pub const MAX_IDS_PER_REQUEST: usize = 1000;

/// Remote table of products keyed by identifier
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Bulk read of identifier + SKU for every listed product that exists.
    /// Products that do not exist are simply absent from the result.
    async fn fetch_products(&self, ids: &[Identifier]) -> Result<Vec<RemoteRecord>>;

    /// Set the preorder flag to false and null its discount and date,
    /// for exactly the listed products.
    async fn clear_preorder(&self, ids: &[Identifier], fields: &PreorderFields) -> Result<()>;
}
