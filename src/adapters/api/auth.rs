//! Requester Authentication — HMAC-SHA1 Request Signing
//!
//! Signs every request with HMAC-SHA1 keyed by the secret access key,
//! over `service + operation + timestamp`. The marketplace recomputes
//! the same digest and rejects mismatches, so the output must be
//! byte-exact: raw digest, standard base64, then form percent-encoding.
//! Credentials come from environment variables
//! (MTURK_ACCESS_KEY, MTURK_SECRET_KEY).

use std::fmt;

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use super::request::percent_encode;
use crate::error::{MarketplaceError, Result};

/// Service name every signature is computed over.
pub const MTURK_SERVICE: &str = "AWSMechanicalTurkRequester";

/// Env var holding the access key id.
pub const ACCESS_KEY_VAR: &str = "MTURK_ACCESS_KEY";

/// Env var holding the secret access key.
pub const SECRET_KEY_VAR: &str = "MTURK_SECRET_KEY";

type HmacSha1 = Hmac<Sha1>;

/// Requester key pair.
///
/// Immutable once built. The secret is never sent on the wire and
/// never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    /// Build credentials, failing fast on an empty key.
    ///
    /// # Errors
    /// Returns `MarketplaceError::Configuration` if either key is empty.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();

        if access_key.trim().is_empty() {
            return Err(MarketplaceError::Configuration(
                "access key must not be empty".to_string(),
            ));
        }
        if secret_key.is_empty() {
            return Err(MarketplaceError::Configuration(
                "secret key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    /// Load credentials from `MTURK_ACCESS_KEY` / `MTURK_SECRET_KEY`.
    ///
    /// # Errors
    /// Returns `MarketplaceError::Configuration` if a variable is unset
    /// or empty.
    pub fn from_env() -> Result<Self> {
        let access_key = std::env::var(ACCESS_KEY_VAR).map_err(|_| {
            MarketplaceError::Configuration(format!("{ACCESS_KEY_VAR} not set"))
        })?;
        let secret_key = std::env::var(SECRET_KEY_VAR).map_err(|_| {
            MarketplaceError::Configuration(format!("{SECRET_KEY_VAR} not set"))
        })?;
        Self::new(access_key, secret_key)
    }

    /// Access key id, sent in clear as `AWSAccessKeyId`.
    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Computes per-request signatures from the shared secret.
#[derive(Clone)]
pub struct CredentialSigner {
    credentials: Credentials,
    /// HMAC state already keyed with the secret; cloned per signature.
    keyed: HmacSha1,
}

impl CredentialSigner {
    /// Key a signer with the secret from `credentials`.
    ///
    /// # Errors
    /// Returns `MarketplaceError::Configuration` if the key is rejected
    /// by the MAC implementation.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let keyed = <HmacSha1 as Mac>::new_from_slice(credentials.secret_key.as_bytes())
            .map_err(|e| MarketplaceError::Configuration(format!("unusable secret key: {e}")))?;
        Ok(Self { credentials, keyed })
    }

    /// Credentials this signer was keyed with.
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Raw 20-byte HMAC-SHA1 digest of `service + operation + timestamp`.
    pub fn digest(&self, service: &str, operation: &str, timestamp: &str) -> [u8; 20] {
        let mut mac = self.keyed.clone();
        mac.update(service.as_bytes());
        mac.update(operation.as_bytes());
        mac.update(timestamp.as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Sign a request.
    ///
    /// Signature format: urlencode(base64(HMAC-SHA1(secret, service + operation + timestamp)))
    pub fn sign(&self, service: &str, operation: &str, timestamp: &str) -> String {
        let digest = self.digest(service, operation, timestamp);
        let encoded = base64::engine::general_purpose::STANDARD.encode(digest);
        percent_encode(&encoded)
    }
}

impl fmt::Debug for CredentialSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSigner")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
