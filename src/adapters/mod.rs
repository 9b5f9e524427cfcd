//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, XML decoding, Prometheus).
//!
//! Adapter categories:
//! - `api`: Requester REST API signing, requests, transport, parsing
//! - `metrics`: Prometheus request metrics

pub mod api;
pub mod metrics;
