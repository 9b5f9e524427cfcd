//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates request building, the transport port and response
//! parsing into the marketplace operations callers use.
//!
//! Use cases:
//! - `TaskClient`: One method per requester operation, including the
//!   two-step assignment approval

pub mod task_client;

pub use task_client::{Endpoint, TaskClient, DEFAULT_PAGE_SIZE};
