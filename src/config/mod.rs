//! Configuration Module - TOML-based Client Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Credentials are deliberately absent from the file: they come from
//! `MTURK_ACCESS_KEY` / `MTURK_SECRET_KEY` (optionally via `.env`).

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::adapters::api::auth::MTURK_SERVICE;
use crate::adapters::api::client::HttpTransportConfig;
use crate::domain::defaults::OperationDefaults;
use crate::usecases::task_client::{Endpoint, PRODUCTION_ENDPOINT};

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Client identity and logging.
  #[serde(default)]
  pub client: ClientConfig,
  /// Marketplace endpoint.
  #[serde(default)]
  pub api: ApiConfig,
  /// Task creation defaults.
  #[serde(default)]
  pub defaults: OperationDefaults,
}

/// Client identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  /// Human-readable client name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Requester REST endpoint.
  #[serde(default = "default_endpoint")]
  pub endpoint: String,
  /// Service name signed into every request.
  #[serde(default = "default_service")]
  pub service: String,
  /// Request timeout in seconds.
  #[serde(default = "default_timeout")]
  pub timeout_seconds: u64,
}

impl AppConfig {
  /// Endpoint the client should talk to.
  pub fn endpoint(&self) -> Endpoint {
    Endpoint {
      url: self.api.endpoint.clone(),
      service: self.api.service.clone(),
    }
  }

  /// Settings for the HTTP transport.
  pub fn transport(&self) -> HttpTransportConfig {
    HttpTransportConfig {
      timeout: Duration::from_secs(self.api.timeout_seconds),
      ..HttpTransportConfig::default()
    }
  }
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
    }
  }
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      endpoint: default_endpoint(),
      service: default_service(),
      timeout_seconds: default_timeout(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "mturk-client".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

fn default_endpoint() -> String {
  PRODUCTION_ENDPOINT.to_string()
}

fn default_service() -> String {
  MTURK_SERVICE.to_string()
}

fn default_timeout() -> u64 {
  30
}
