use crate::config::UpstreamConfig;
use crate::error::{AppError, Result};
use crate::upstream::MarketSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, error, info};

/// HTTP client for the Gamma market-data API. No auth, no retries.
#[derive(Debug, Clone)]
pub struct GammaClient {
    client: Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.build_url(path, query)?;
        info!("Fetching upstream {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, "Upstream request failed: {}", body);
            return Err(AppError::Upstream { status, body });
        }

        let body: Value = response.json().await?;
        debug!("Upstream request succeeded");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_UPSTREAM_URL;

    fn client(base_url: &str) -> GammaClient {
        GammaClient::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            timeout_secs: None,
        })
        .unwrap()
    }

    #[test]
    fn builds_url_without_query() {
        let url = client(DEFAULT_UPSTREAM_URL).build_url("/markets/123", &[]).unwrap();
        assert_eq!(url.as_str(), "https://gamma-api.polymarket.com/markets/123");
    }

    #[test]
    fn keeps_query_insertion_order() {
        let query = [
            ("closed", "false".to_string()),
            ("limit", "5".to_string()),
            ("offset", "0".to_string()),
        ];
        let url = client(DEFAULT_UPSTREAM_URL).build_url("/markets", &query).unwrap();
        assert_eq!(url.query(), Some("closed=false&limit=5&offset=0"));
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let client = client("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
        let url = client.build_url("/markets", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/markets");
    }
}
