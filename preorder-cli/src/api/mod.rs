//! Hosted product table access
//!
//! Talks to a Supabase project through its PostgREST endpoint. The
//! reconciler only sees the `ProductStore` trait, so tests and dry runs
//! can swap the HTTP client out.

pub mod client;
pub mod models;
pub mod operations;
pub mod query;
pub mod resilience;
pub mod store;

pub use client::SupabaseStore;
pub use resilience::ResilienceConfig;
