//! HTTP Transport - reqwest-backed GET Adapter
//!
//! Implements the `Transport` port with a single reqwest client.
//! One attempt per call: no retries, no rate limiting. Errors are
//! stripped of their URL before being surfaced, since the query
//! carries the access key and signature.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::ports::transport::{Transport, TransportError};

/// Longest error body kept in `TransportError::Status`.
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
  /// Request timeout.
  pub timeout: Duration,
  /// User-Agent header value.
  pub user_agent: String,
}

impl Default for HttpTransportConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(30),
      user_agent: format!("mturk-client/{}", env!("CARGO_PKG_VERSION")),
    }
  }
}

/// GET transport over reqwest with rustls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  /// Underlying HTTP client.
  http: Client,
}

impl HttpTransport {
  /// Create a new transport.
  pub fn new(config: &HttpTransportConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .user_agent(config.user_agent.clone())
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http })
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
    let response = self.http.get(url).send().await.map_err(|e| {
      let e = e.without_url();
      warn!(error = %e, "Request failed");
      TransportError::Request(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let body = truncate(&body, MAX_ERROR_BODY);
      warn!(status = %status, "Marketplace returned error status");
      return Err(TransportError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| TransportError::Body(e.without_url().to_string()))?;

    debug!(status = %status, bytes = bytes.len(), "Response received");
    Ok(bytes.to_vec())
  }
}

fn truncate(body: &str, max: usize) -> String {
  if body.len() <= max {
    return body.to_string();
  }
  let mut end = max;
  while !body.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}…", &body[..end])
}
