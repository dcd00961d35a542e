use crate::error::{AppError, Result};
use crate::mcp::format;
use crate::mcp::types::ToolDefinition;
use crate::upstream::models::scalar_text;
use crate::upstream::{Market, MarketSource};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const LIST_LIMIT_MIN: i64 = 1;
pub const LIST_LIMIT_MAX: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    GetMarketInfo,
    ListMarkets,
    GetMarketPrices,
    Unknown(String),
}

impl ToolName {
    pub fn as_str(&self) -> &str {
        match self {
            ToolName::GetMarketInfo => "get-market-info",
            ToolName::ListMarkets => "list-markets",
            ToolName::GetMarketPrices => "get-market-prices",
            ToolName::Unknown(name) => name,
        }
    }
}

impl From<&str> for ToolName {
    fn from(name: &str) -> Self {
        match name {
            "get-market-info" => ToolName::GetMarketInfo,
            "list-markets" => ToolName::ListMarkets,
            "get-market-prices" => ToolName::GetMarketPrices,
            other => ToolName::Unknown(other.to_string()),
        }
    }
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: ToolName::GetMarketInfo.as_str().to_string(),
            description: "Get detailed information about a specific prediction market: title, category, status, end date, volume, liquidity, outcome prices and description.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "market_id": {
                        "type": "string",
                        "description": "Market ID or slug"
                    }
                },
                "required": ["market_id"]
            }),
        },
        ToolDefinition {
            name: ToolName::ListMarkets.as_str().to_string(),
            description: "List prediction markets with optional filtering and pagination.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "closed": {
                        "type": "boolean",
                        "description": "Filter by market status: true for closed markets, false for open markets"
                    },
                    "limit": {
                        "type": "number",
                        "description": "Number of markets to return",
                        "default": 10,
                        "minimum": LIST_LIMIT_MIN,
                        "maximum": LIST_LIMIT_MAX
                    },
                    "offset": {
                        "type": "number",
                        "description": "Number of markets to skip (for pagination)",
                        "default": 0,
                        "minimum": 0
                    }
                }
            }),
        },
        ToolDefinition {
            name: ToolName::GetMarketPrices.as_str().to_string(),
            description: "Get current prices and implied probabilities for every outcome of a prediction market.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "market_id": {
                        "type": "string",
                        "description": "Market ID or slug"
                    }
                },
                "required": ["market_id"]
            }),
        },
    ]
}

/// Runs the market tools against a `MarketSource`.
///
/// Failures never leave `execute`: they are rendered as `Error: <message>`
/// text so the caller always gets a successful tool result.
#[derive(Clone)]
pub struct ToolExecutor {
    source: Arc<dyn MarketSource>,
}

impl ToolExecutor {
    pub fn new(source: Arc<dyn MarketSource>) -> Self {
        Self { source }
    }

    pub async fn execute(&self, name: &str, arguments: &Value) -> String {
        let tool = ToolName::from(name);
        info!(tool = tool.as_str(), "Executing tool");

        match self.run(&tool, arguments).await {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = tool.as_str(), error = %e, "Tool execution failed");
                format!("Error: {}", e)
            }
        }
    }

    async fn run(&self, tool: &ToolName, arguments: &Value) -> Result<String> {
        match tool {
            ToolName::GetMarketInfo => {
                let market = self.fetch_market(arguments).await?;
                Ok(market
                    .map(|m| format::market_report(&m))
                    .unwrap_or_else(|| format::MARKET_NOT_FOUND.to_string()))
            }
            ToolName::ListMarkets => {
                let query = list_query(arguments);
                let body = self.source.fetch("/markets", &query).await?;
                let markets = Market::list_from_body(body)?;
                Ok(format::market_list(&markets))
            }
            ToolName::GetMarketPrices => {
                let market = self.fetch_market(arguments).await?;
                Ok(market
                    .map(|m| format::market_prices(&m))
                    .unwrap_or_else(|| format::MARKET_NOT_FOUND.to_string()))
            }
            ToolName::Unknown(name) => Err(AppError::UnknownTool(name.clone())),
        }
    }

    async fn fetch_market(&self, arguments: &Value) -> Result<Option<Market>> {
        let body = self
            .source
            .fetch(&format!("/markets/{}", market_id(arguments)), &[])
            .await?;
        Ok(Market::from_body(body)?)
    }
}

/// `market_id` is passed through unvalidated; absent means an empty path segment.
fn market_id(arguments: &Value) -> String {
    arguments
        .get("market_id")
        .and_then(scalar_text)
        .unwrap_or_default()
}

/// Build the `/markets` query in `closed`, `limit`, `offset` order.
///
/// Values are forwarded as given and range checks are left to upstream.
/// The one exception is a zero `limit`, which is dropped; `offset: 0` is kept.
fn list_query(arguments: &Value) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();

    if let Some(closed) = arguments.get("closed").and_then(scalar_text) {
        query.push(("closed", closed));
    }

    if let Some(limit) = arguments
        .get("limit")
        .filter(|v| !is_zero(v))
        .and_then(scalar_text)
    {
        query.push(("limit", limit));
    }

    if let Some(offset) = arguments.get("offset").and_then(scalar_text) {
        query.push(("offset", offset));
    }

    query
}

fn is_zero(value: &Value) -> bool {
    value.as_f64() == Some(0.0)
}
