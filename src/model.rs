//! Key records and the JSON bodies exchanged over HTTP.

use serde::{Deserialize, Serialize};

/// A single license/activation key and its expiration date.
///
/// `expiration_date` is stored as given; the registry never parses it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeyRecord {
    pub key_string: String,
    pub expiration_date: String,
}

impl KeyRecord {
    pub fn new(key_string: impl Into<String>, expiration_date: impl Into<String>) -> Self {
        Self {
            key_string: key_string.into(),
            expiration_date: expiration_date.into(),
        }
    }
}

/// Body of `POST /keys`. Fields are optional so that a missing field
/// surfaces as a 400 with a readable message instead of a rejection.
#[derive(Deserialize, Debug, Default)]
pub struct CreateKeyRequest {
    #[serde(default)]
    pub key_string: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
}

/// Body of `PUT /keys/{key_str}`.
#[derive(Deserialize, Debug, Default)]
pub struct UpdateKeyRequest {
    #[serde(default)]
    pub expiration_date: Option<String>,
}

/// Plain `{"message": ...}` body used for every error response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

/// Response to a successful create.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyCreatedResponse {
    pub message: String,
    pub key: KeyRecord,
}

/// Response to a successful update or delete.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyChangedResponse {
    pub message: String,
    pub key_string: String,
}
