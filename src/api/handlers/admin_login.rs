//! Login landing page contract.
//!
//! Cookie issuance lives elsewhere; this endpoint only decides where a visitor
//! goes next. An admin who already holds a valid session is sent straight to
//! the resolved `next` path, anyone else gets the resolved path back so the
//! login form can carry it.

use axum::{
    Json,
    extract::{Extension, RawQuery},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::auth::{AdminGate, redirect::next_values, resolve_next};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLogin {
    /// Where the visitor lands after signing in.
    pub next: String,
}

#[utoipa::path(
    get,
    path = "/admin-login",
    params(
        ("next" = Option<String>, Query, description = "Path to return to after login; only same-site paths are honored")
    ),
    responses(
        (status = 200, description = "Not signed in; resolved return path.", body = AdminLogin),
        (status = 307, description = "Already signed in; redirect to the resolved return path."),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn admin_login(
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    gate: Extension<Arc<AdminGate>>,
) -> Response {
    let candidates = next_values(query.as_deref());
    let next = resolve_next(candidates.as_slice(), gate.default_next());

    if gate.is_admin(&headers) {
        debug!(next = %next, "admin already signed in");
        return Redirect::temporary(&next).into_response();
    }

    Json(AdminLogin { next }).into_response()
}
