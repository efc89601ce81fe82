//! Keyed settings endpoints.
//!
//! Reads are public because page metadata and the footer are built from them.
//! Writes require the admin session; the request body is stored as-is.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    auth::AdminGate,
    settings::{SettingsRecord, SettingsStore},
};

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "All settings records, ordered by key.", body = [SettingsRecord]),
        (status = 503, description = "Settings store unavailable."),
    ),
    tag = "settings"
)]
#[instrument(skip_all)]
pub async fn list_settings(store: Extension<Arc<dyn SettingsStore>>) -> Response {
    match store.get_all().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/settings/{key}",
    params(
        ("key" = String, Path, description = "Settings key, e.g. `site`")
    ),
    responses(
        (status = 200, description = "Settings record.", body = SettingsRecord),
        (status = 404, description = "No record for this key."),
        (status = 503, description = "Settings store unavailable."),
    ),
    tag = "settings"
)]
#[instrument(skip_all, fields(key = %key))]
pub async fn get_setting(
    Path(key): Path<String>,
    store: Extension<Arc<dyn SettingsStore>>,
) -> Response {
    match store.get_by_key(&key).await {
        Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/settings/{key}",
    params(
        ("key" = String, Path, description = "Settings key, e.g. `site`")
    ),
    request_body(content = Object, description = "New value for the key; any JSON document"),
    responses(
        (status = 200, description = "Record after the upsert.", body = SettingsRecord),
        (status = 400, description = "Empty key, or a key with surrounding whitespace."),
        (status = 401, description = "Missing or invalid admin session."),
        (status = 409, description = "Concurrent write to the same key."),
        (status = 503, description = "Settings store unavailable."),
    ),
    tag = "settings"
)]
#[instrument(skip_all, fields(key = %key))]
pub async fn put_setting(
    Path(key): Path<String>,
    headers: HeaderMap,
    gate: Extension<Arc<AdminGate>>,
    store: Extension<Arc<dyn SettingsStore>>,
    Json(value): Json<Value>,
) -> Response {
    if !gate.is_admin(&headers) {
        debug!("settings write without admin session");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    // Keys are stored verbatim, never trimmed.
    if key.is_empty() || key.trim() != key {
        debug!("settings key rejected");
        return StatusCode::BAD_REQUEST.into_response();
    }

    match store.upsert(&key, value).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}
