use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use dohy::{
    api,
    auth::{AUTHENTICATED_MARKER, AdminGate, SignedCookieVerifier},
    settings::{MemorySettingsStore, SettingsStore},
};
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with_gate(gate: AdminGate) -> Router {
    let store: Arc<dyn SettingsStore> = Arc::new(MemorySettingsStore::default());
    api::app(store, Arc::new(gate))
}

fn app() -> Router {
    app_with_gate(AdminGate::default())
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap_or_default()
}

fn location(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    serde_json::from_slice(&bytes).unwrap_or_default()
}

#[tokio::test]
async fn unauthenticated_dashboard_child_redirects_to_login() {
    let response = app()
        .oneshot(get("/dashboard/orders", None))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        location(&response),
        Some("/admin-login?next=%2Fdashboard%2Forders")
    );
}

#[tokio::test]
async fn wrong_cookie_value_redirects() {
    let response = app()
        .oneshot(get("/dashboard", Some("admin_session=nope")))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/admin-login?next=%2Fdashboard"));
}

#[tokio::test]
async fn redirect_preserves_query_string() {
    let response = app()
        .oneshot(get("/dashboard/settings?tab=payment", None))
        .await
        .unwrap_or_default();
    assert_eq!(
        location(&response),
        Some("/admin-login?next=%2Fdashboard%2Fsettings%3Ftab%3Dpayment")
    );
}

#[tokio::test]
async fn authenticated_dashboard_passes_through() {
    let cookie = format!("theme=dark; admin_session={AUTHENTICATED_MARKER}");
    let response = app()
        .oneshot(get("/dashboard", Some(cookie.as_str())))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["store"], "memory");
    assert_eq!(body["storeAvailable"], true);
    assert!(body["settings"].as_array().is_some_and(Vec::is_empty));
}

#[tokio::test]
async fn authenticated_unknown_dashboard_path_is_not_found() {
    let response = app()
        .oneshot(get("/dashboard/orders", Some("admin_session=authenticated")))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn public_paths_are_not_gated() {
    for uri in ["/", "/health", "/api/slug?text=Kh%C3%B3a%20h%E1%BB%8Dc"] {
        let response = app().oneshot(get(uri, None)).await.unwrap_or_default();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn prefix_lookalike_is_not_gated() {
    let response = app().oneshot(get("/dashboards", None)).await.unwrap_or_default();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(location(&response).is_none());
}

#[tokio::test]
async fn admin_login_returns_resolved_next_for_visitors() {
    let response = app()
        .oneshot(get("/admin-login?next=%2Fdashboard%2Forders", None))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["next"], "/dashboard/orders");
}

#[tokio::test]
async fn admin_login_rejects_protocol_relative_next() {
    for query in ["next=%2F%2Fevil.com", "next=https%3A%2F%2Fevil.com", "next=", ""] {
        let uri = format!("/admin-login?{query}");
        let response = app().oneshot(get(&uri, None)).await.unwrap_or_default();
        assert_eq!(json_body(response).await["next"], "/dashboard", "{query}");
    }
}

#[tokio::test]
async fn admin_login_uses_first_of_repeated_next() {
    let response = app()
        .oneshot(get("/admin-login?next=%2Fdashboard%2Fa&next=%2Fdashboard%2Fb", None))
        .await
        .unwrap_or_default();
    assert_eq!(json_body(response).await["next"], "/dashboard/a");
}

#[tokio::test]
async fn signed_in_admin_is_sent_to_next() {
    let response = app()
        .oneshot(get(
            "/admin-login?next=%2Fdashboard%2Fsettings",
            Some("admin_session=authenticated"),
        ))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), Some("/dashboard/settings"));

    let response = app()
        .oneshot(get("/admin-login?next=%2F%2Fevil.com", Some("admin_session=authenticated")))
        .await
        .unwrap_or_default();
    assert_eq!(location(&response), Some("/dashboard"));
}

#[tokio::test]
async fn signed_gate_requires_signature() {
    let Ok(verifier) = SignedCookieVerifier::new(&SecretString::from("x".repeat(64))) else {
        panic!("key should be accepted");
    };
    let signed = verifier.sign(AUTHENTICATED_MARKER);
    let app = app_with_gate(AdminGate::new(Arc::new(verifier)));

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some("admin_session=authenticated")))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let cookie = format!("admin_session={signed}");
    let response = app
        .oneshot(get("/dashboard", Some(cookie.as_str())))
        .await
        .unwrap_or_default();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let response = app().oneshot(get("/health", None)).await.unwrap_or_default();
    assert!(response.headers().contains_key(api::REQUEST_ID_HEADER));

    let request = Request::builder()
        .uri("/health")
        .header(api::REQUEST_ID_HEADER, "req-123")
        .body(Body::empty())
        .unwrap_or_default();
    let response = app().oneshot(request).await.unwrap_or_default();
    assert_eq!(
        response
            .headers()
            .get(api::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("req-123")
    );
}
