//! Metrics Adapter
//!
//! Prometheus counters and latency histograms for marketplace
//! requests, rendered in the text exposition format on demand.

pub mod prometheus;

pub use self::prometheus::ClientMetrics;
