use axum::{
    extract::State,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json},
};

use crate::server::AppState;

/// Middleware that protects `/api/*` routes.
///
/// Without a configured API token every request passes through. Otherwise
/// the request must carry `Authorization: Bearer <token>`.
pub async fn require_auth(
    State(state): State<AppState>,
    request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    if state.gateway.verify_token(presented) {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({"error": "not authenticated"})),
    )
        .into_response()
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}
