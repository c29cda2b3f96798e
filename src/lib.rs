//! Registry of license/activation keys served over HTTP.
//!
//! Keys live in a single JSON file that is re-read on every request and
//! rewritten after every change. Reads are open; create, update and delete
//! require the shared secret in the `X-API-Key` header.

pub mod api;
pub mod auth;
pub mod error;
pub mod model;
pub mod registry;
pub mod store;

pub use api::{build_router, ApiError, AppState};
pub use auth::{ApiSecret, API_KEY_HEADER};
pub use error::{RegistryError, RegistryResult, StoreError, StoreResult};
pub use model::{KeyChangedResponse, KeyCreatedResponse, KeyRecord, MessageResponse};
pub use registry::KeyRegistry;
pub use store::KeyFile;
