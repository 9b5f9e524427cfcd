//! Prometheus Metrics Registry - Request Observability
//!
//! Counts requests per operation and outcome and records round-trip
//! latency. All metrics follow the naming convention `mturk_client_*`.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

use crate::domain::operation::Operation;

/// Outcome label for successful calls.
pub const OUTCOME_OK: &str = "ok";

/// Centralized Prometheus metrics for the client.
#[derive(Clone)]
pub struct ClientMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Requests by operation and outcome.
    pub requests: IntCounterVec,
    /// Round-trip latency histogram (milliseconds).
    pub latency_ms: HistogramVec,
}

impl ClientMetrics {
    /// Create and register all metrics on a fresh registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "mturk_client_requests_total",
                "Requests issued, by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;

        let latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "mturk_client_request_latency_ms",
                "Request round-trip latency in milliseconds",
            )
            .buckets(vec![25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]),
            &["operation"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency_ms.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency_ms,
        })
    }

    /// Record one finished round-trip.
    pub fn observe(&self, operation: Operation, outcome: &str, elapsed_ms: f64) {
        self.requests
            .with_label_values(&[operation.name(), outcome])
            .inc();
        self.latency_ms
            .with_label_values(&[operation.name()])
            .observe(elapsed_ms);
    }

    /// Count of requests for `operation` with `outcome`.
    pub fn count(&self, operation: Operation, outcome: &str) -> u64 {
        self.requests
            .with_label_values(&[operation.name(), outcome])
            .get()
    }

    /// Render all metrics in the text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_and_encode() {
        let metrics = ClientMetrics::new().unwrap();
        metrics.observe(Operation::GetAccountBalance, OUTCOME_OK, 42.0);
        metrics.observe(Operation::GetAccountBalance, "transport", 10.0);

        assert_eq!(metrics.count(Operation::GetAccountBalance, OUTCOME_OK), 1);
        assert_eq!(metrics.count(Operation::GetAccountBalance, "transport"), 1);
        assert_eq!(metrics.count(Operation::DisposeHit, OUTCOME_OK), 0);

        let text = metrics.encode().unwrap();
        assert!(text.contains("mturk_client_requests_total"));
        assert!(text.contains("operation=\"GetAccountBalance\""));
        assert!(text.contains("mturk_client_request_latency_ms"));
    }
}
