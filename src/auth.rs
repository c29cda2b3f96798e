//! Shared-secret gate for mutating requests.

use std::fmt;

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::api::ApiError;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The static secret required by create, update and delete.
#[derive(Clone)]
pub struct ApiSecret(String);

impl ApiSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against a presented value.
    /// An empty configured secret matches nothing.
    pub fn verify(&self, presented: impl AsRef<[u8]>) -> bool {
        !self.0.is_empty() && bool::from(self.0.as_bytes().ct_eq(presented.as_ref()))
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecret(<redacted>)")
    }
}

/// Reject the request unless `X-API-Key` matches `secret`.
pub fn authorize(headers: &HeaderMap, secret: &ApiSecret) -> Result<(), ApiError> {
    // Raw bytes: the secret may hold non-ASCII UTF-8.
    match headers.get(API_KEY_HEADER) {
        Some(value) if secret.verify(value.as_bytes()) => Ok(()),
        _ => Err(ApiError::unauthorized()),
    }
}
