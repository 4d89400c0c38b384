use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::utils::config::{join_url, Config};

/// Status, parsed body and round-trip time of one request
///
/// Non-2xx statuses are returned as-is; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body, `Value::Null` when empty or not JSON
    pub data: Value,
    pub elapsed: Duration,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Authenticated JSON client bound to one base URL
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client, falling back to the configured base URL and token
    pub fn new(config: &Config, base_url: Option<&str>, token: Option<&str>) -> Result<Self> {
        let base_url = base_url.unwrap_or(&config.api_base_url).to_string();
        let token = token.map(str::to_string).or_else(|| config.api_token.clone());

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("API token is not a valid header value")?;
                headers.insert(AUTHORIZATION, value);
            }
            None => log::warn!("API_TOKEN not configured, sending requests without Authorization"),
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeouts.api_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config, None, None)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = join_url(&self.base_url, path);
        log::debug!("GET {}", url);
        let started = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        Self::into_api_response(response, started).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let url = join_url(&self.base_url, path);
        log::debug!("POST {}", url);
        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        Self::into_api_response(response, started).await
    }

    async fn into_api_response(
        response: reqwest::Response,
        started: Instant,
    ) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await.context("Failed to read response body")?;
        let elapsed = started.elapsed();

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or_else(|e| {
                log::debug!("Response body is not JSON ({}): {}", e, body);
                Value::Null
            })
        };
        log::debug!("-> {} in {}ms", status, elapsed.as_millis());

        Ok(ApiResponse {
            status,
            data,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_explicit_base_url_wins() {
        let config = Config::from_map(&HashMap::new());
        let client = ApiClient::new(&config, Some("http://127.0.0.1:9"), Some("t")).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");

        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), config.api_base_url);
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let config = Config::from_map(&HashMap::new());
        assert!(ApiClient::new(&config, None, Some("bad\ntoken")).is_err());
    }

    #[test]
    fn test_response_success_range() {
        let response = ApiResponse {
            status: 201,
            data: Value::Null,
            elapsed: Duration::from_millis(12),
        };
        assert!(response.is_success());
        assert_eq!(response.elapsed_ms(), 12);
        assert!(!ApiResponse { status: 302, ..response }.is_success());
    }
}
