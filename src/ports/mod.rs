//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the client use case requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `Clock`: Source of request timestamps
//! - `Transport`: One GET round-trip to the marketplace

pub mod clock;
pub mod transport;
