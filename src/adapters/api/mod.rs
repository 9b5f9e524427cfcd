//! Requester API Adapter
//!
//! Implements request signing, request construction, the HTTP
//! transport and XML envelope decoding for the marketplace's
//! requester REST API.
//!
//! Sub-modules:
//! - `auth`: Credentials and HMAC-SHA1 signatures
//! - `client`: reqwest implementation of the `Transport` port
//! - `parser`: Typed decoding of response envelopes
//! - `request`: Signed, ordered query construction
//! - `types`: XML envelope definitions

pub mod auth;
pub mod client;
pub mod parser;
pub mod request;
pub mod types;
