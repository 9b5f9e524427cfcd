//! Mechanical Turk Requester Client — Library Root
//!
//! Signed requests to the requester REST API and typed decoding of
//! its XML responses. Re-exports all modules for integration tests
//! and benchmarks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod usecases;

pub use error::{MarketplaceError, Result, WorkflowError};
