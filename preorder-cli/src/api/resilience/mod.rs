//! Retry and timeout handling for product store requests

pub mod config;
pub mod retry;

pub use config::ResilienceConfig;
pub use retry::{RetryConfig, RetryPolicy};
