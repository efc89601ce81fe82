//! Admin dashboard data. Both routes sit behind the admin gate.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::settings::{SettingsError, SettingsRecord, SettingsStore};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub store: String,
    /// `false` when the store could not be reached; `settings` is then empty.
    pub store_available: bool,
    pub settings: Vec<SettingsRecord>,
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard overview.", body = DashboardOverview),
        (status = 307, description = "No admin session; redirect to the login page."),
    ),
    tag = "dashboard"
)]
#[instrument(skip_all)]
pub async fn overview(store: Extension<Arc<dyn SettingsStore>>) -> Response {
    let (settings, store_available) = match store.get_all().await {
        Ok(settings) => (settings, true),
        Err(SettingsError::Unavailable(reason)) => {
            warn!("Rendering dashboard without settings: {reason}");
            (Vec::new(), false)
        }
        Err(err) => return err.into_response(),
    };

    (
        StatusCode::OK,
        Json(DashboardOverview {
            store: store.backend().to_string(),
            store_available,
            settings,
        }),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/dashboard/settings",
    responses(
        (status = 200, description = "All settings records.", body = [SettingsRecord]),
        (status = 307, description = "No admin session; redirect to the login page."),
        (status = 503, description = "Settings store unavailable."),
    ),
    tag = "dashboard"
)]
#[instrument(skip_all)]
pub async fn settings(store: Extension<Arc<dyn SettingsStore>>) -> Response {
    match store.get_all().await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => err.into_response(),
    }
}
