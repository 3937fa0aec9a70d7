//! Send and query endpoints.

use {
    axum::{
        Form,
        extract::{FromRequest, Request, State},
        http::{StatusCode, header},
        response::{IntoResponse, Json, Response},
    },
    serde::Serialize,
    tracing::{info, warn},
    wabridge_relay::SendRequest,
};

use crate::server::AppState;

/// Boolean outcome returned by the send endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SendResponse {
    pub status: bool,
}

/// `POST /api/message/send`, JSON or url-encoded form body.
///
/// Failures of any kind are reported as `{"status": false}` with `200 OK`.
pub async fn send_handler(State(state): State<AppState>, request: Request) -> Json<SendResponse> {
    let Some(payload) = parse_send_request(request).await else {
        return Json(SendResponse { status: false });
    };

    match state.gateway.bridge.send_message(&payload).await {
        Ok(receipt) => {
            info!(receiver = %payload.receiver, message_id = %receipt.id, "send request completed");
            Json(SendResponse { status: true })
        },
        Err(e) => {
            warn!(receiver = %payload.receiver, error = %e, "send request failed");
            Json(SendResponse { status: false })
        },
    }
}

async fn parse_send_request(request: Request) -> Option<SendRequest> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let parsed = if is_json {
        Json::<SendRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|e| e.body_text())
    } else {
        Form::<SendRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|e| e.body_text())
    };

    match parsed {
        Ok(body) => Some(body),
        Err(e) => {
            warn!(error = %e, "invalid send request body");
            None
        },
    }
}

/// `GET /api/message/last`: the latest raw inbound event, or `404`.
pub async fn last_handler(State(state): State<AppState>) -> Response {
    match state.gateway.bridge.last_message() {
        Some(event) => Json(event).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "no message received yet"})),
        )
            .into_response(),
    }
}
