pub mod client;
pub mod models;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use client::GammaClient;
pub use models::{Market, OutcomePrices, Token};

/// Source of raw market JSON. `GammaClient` is the production implementation.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// GET `path` with `query` appended in order, returning the decoded body.
    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;
}
