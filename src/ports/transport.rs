//! Transport Port - Single GET Round-Trip
//!
//! The client needs exactly one capability from the network: send a
//! GET for a fully built URL and hand back the body bytes. Retries,
//! rate limiting and connection pooling belong to the implementor.

use async_trait::async_trait;
use thiserror::Error;

/// Network or HTTP-level failure.
///
/// Messages never contain the request URL, which carries the
/// access key and signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
  /// The request could not be sent or timed out.
  #[error("request failed: {0}")]
  Request(String),
  /// The endpoint answered with a non-success status.
  #[error("HTTP {status} from marketplace: {body}")]
  Status {
    /// HTTP status code.
    status: u16,
    /// Response body, possibly truncated.
    body: String,
  },
  /// The response body could not be read.
  #[error("failed to read response body: {0}")]
  Body(String),
}

/// Trait for HTTP transports.
///
/// Implementors perform one GET per call and return the raw body.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  /// Issue a GET for `url`.
  ///
  /// # Errors
  /// Returns `TransportError` on any network or status failure.
  async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
