//! HTTP API for the key registry.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::{
    auth::{ApiSecret, authorize},
    error::{RegistryError, RegistryResult},
    model::{
        CreateKeyRequest, KeyChangedResponse, KeyCreatedResponse, KeyRecord, MessageResponse,
        UpdateKeyRequest,
    },
    registry::KeyRegistry,
};

const CREATE_FIELDS_MISSING: &str =
    "Incomplete key data. 'key_string' and 'expiration_date' are required.";
const UPDATE_FIELDS_MISSING: &str = "Incomplete update data. 'expiration_date' is required.";

/// Everything the handlers share.
#[derive(Debug)]
pub struct AppState {
    pub registry: KeyRegistry,
    pub secret: ApiSecret,
}

impl AppState {
    pub fn new(registry: KeyRegistry, secret: ApiSecret) -> Self {
        Self { registry, secret }
    }
}

// ==================== Error Handling ====================

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub Json<MessageResponse>);

impl ApiError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        ApiError(status, Json(MessageResponse { message: msg.into() }))
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized access.")
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Conflict(_) => ApiError::conflict("Key already exists."),
            RegistryError::NotFound(_) => ApiError::not_found("Key not found."),
            RegistryError::Store(e) => {
                error!("Key store failure: {}", e);
                ApiError::internal("Failed to access key storage.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// Run a registry operation on the blocking pool. File IO and the registry
/// lock never occupy a runtime worker.
async fn with_registry<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&KeyRegistry) -> RegistryResult<T> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || op(&state.registry))
        .await
        .map_err(|e| {
            error!("Key store task failed: {}", e);
            ApiError::internal("Failed to access key storage.")
        })?
        .map_err(ApiError::from)
}

/// Decode a JSON object body regardless of `Content-Type`.
/// Anything else (empty, invalid, non-object, wrong field types) is a 400.
fn parse_body<T: DeserializeOwned>(body: &[u8], missing: &str) -> Result<T, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ApiError::bad_request(missing))?;
    if !value.is_object() {
        return Err(ApiError::bad_request(missing));
    }
    serde_json::from_value(value).map_err(|_| ApiError::bad_request(missing))
}

// ==================== Handlers ====================

/// Every registered key. Unauthenticated.
async fn list_keys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<KeyRecord>>, ApiError> {
    let keys = with_registry(&state, |registry| registry.list()).await?;
    Ok(Json(keys))
}

async fn create_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<KeyCreatedResponse>), ApiError> {
    authorize(&headers, &state.secret)?;

    let request: CreateKeyRequest = parse_body(&body, CREATE_FIELDS_MISSING)?;
    let (Some(key_string), Some(expiration_date)) = (request.key_string, request.expiration_date)
    else {
        return Err(ApiError::bad_request(CREATE_FIELDS_MISSING));
    };

    let record = KeyRecord::new(key_string, expiration_date);
    let key = with_registry(&state, move |registry| registry.create(record)).await?;

    Ok((
        StatusCode::CREATED,
        Json(KeyCreatedResponse {
            message: "Key added successfully.".to_string(),
            key,
        }),
    ))
}

async fn update_key(
    State(state): State<Arc<AppState>>,
    Path(key_str): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<KeyChangedResponse>, ApiError> {
    authorize(&headers, &state.secret)?;

    let request: UpdateKeyRequest = parse_body(&body, UPDATE_FIELDS_MISSING)?;
    let Some(expiration_date) = request.expiration_date else {
        return Err(ApiError::bad_request(UPDATE_FIELDS_MISSING));
    };

    let updated = with_registry(&state, move |registry| {
        registry.update_expiration(&key_str, expiration_date)
    })
    .await?;

    Ok(Json(KeyChangedResponse {
        message: "Key updated successfully.".to_string(),
        key_string: updated.key_string,
    }))
}

async fn delete_key(
    State(state): State<Arc<AppState>>,
    Path(key_str): Path<String>,
    headers: HeaderMap,
) -> Result<Json<KeyChangedResponse>, ApiError> {
    authorize(&headers, &state.secret)?;

    let target = key_str.clone();
    with_registry(&state, move |registry| registry.delete(&target)).await?;

    Ok(Json(KeyChangedResponse {
        message: "Key deleted successfully.".to_string(),
        key_string: key_str,
    }))
}

/// Build the HTTP API router with the given registry state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/keys", get(list_keys).post(create_key))
        .route("/keys/{key_str}", put(update_key).delete(delete_key))
        .with_state(state)
}
