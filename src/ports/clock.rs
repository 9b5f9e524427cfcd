//! Clock Port - Request Timestamps
//!
//! Every signed request carries a UTC timestamp in the form
//! `YYYY-MM-DDTHH:MM:SSZ`. The clock is a port so tests can pin it.

use chrono::{DateTime, Utc};

/// strftime pattern of the `Timestamp` parameter.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Source of the current instant.
pub trait Clock: Send + Sync + 'static {
  /// Current instant in UTC.
  fn now(&self) -> DateTime<Utc>;
}

/// Render an instant in the marketplace's timestamp format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    self.0
  }
}
