//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;

/// Shortest assignment duration / lifetime the marketplace accepts.
const MIN_WINDOW_SECONDS: u64 = 30;

/// Longest assignment duration / lifetime (one year).
const MAX_WINDOW_SECONDS: u64 = 31_536_000;

/// Longest auto-approval delay (30 days).
const MAX_AUTO_APPROVE_SECONDS: u64 = 2_592_000;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    endpoint = %config.api.endpoint,
    title = %config.defaults.title,
    reward = %config.defaults.reward,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig =
    toml::from_str(content).with_context(|| "Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A usable endpoint and service name
/// - Positive reward and a currency code
/// - Duration, lifetime and auto-approval windows within API limits
/// - Qualification percentage in [0, 100] and at least one assignment
fn validate_config(config: &AppConfig) -> Result<()> {
  // API validation
  anyhow::ensure!(
    config.api.endpoint.starts_with("http://") || config.api.endpoint.starts_with("https://"),
    "API endpoint must be an http(s) URL, got {:?}",
    config.api.endpoint
  );
  anyhow::ensure!(
    !config.api.service.trim().is_empty(),
    "Service name must not be empty"
  );
  anyhow::ensure!(
    config.api.timeout_seconds > 0,
    "timeout_seconds must be positive"
  );

  // Defaults validation
  let defaults = &config.defaults;
  anyhow::ensure!(
    !defaults.title.trim().is_empty(),
    "Default title must not be empty"
  );
  anyhow::ensure!(
    defaults.reward > Decimal::ZERO,
    "Default reward must be positive, got {}",
    defaults.reward
  );
  anyhow::ensure!(
    !defaults.reward_currency.trim().is_empty(),
    "Default reward_currency must not be empty"
  );
  anyhow::ensure!(
    (MIN_WINDOW_SECONDS..=MAX_WINDOW_SECONDS).contains(&defaults.duration_seconds),
    "duration_seconds must be in [{MIN_WINDOW_SECONDS}, {MAX_WINDOW_SECONDS}], got {}",
    defaults.duration_seconds
  );
  anyhow::ensure!(
    (MIN_WINDOW_SECONDS..=MAX_WINDOW_SECONDS).contains(&defaults.lifetime_seconds),
    "lifetime_seconds must be in [{MIN_WINDOW_SECONDS}, {MAX_WINDOW_SECONDS}], got {}",
    defaults.lifetime_seconds
  );
  anyhow::ensure!(
    defaults.auto_approve_delay_seconds <= MAX_AUTO_APPROVE_SECONDS,
    "auto_approve_delay_seconds must be at most {MAX_AUTO_APPROVE_SECONDS}, got {}",
    defaults.auto_approve_delay_seconds
  );
  anyhow::ensure!(
    defaults.min_approval_percentage <= 100,
    "min_approval_percentage must be in [0, 100], got {}",
    defaults.min_approval_percentage
  );
  anyhow::ensure!(
    defaults.max_assignments >= 1,
    "max_assignments must be at least 1"
  );

  Ok(())
}
