use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::State,
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::info,
};

use crate::{
    auth_middleware::require_auth,
    message_routes::{last_handler, send_handler},
    state::GatewayState,
};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app_state = AppState { gateway: state };

    let protected = Router::new()
        .route("/api/message/send", post(send_handler))
        .route("/api/message/last", get(last_handler))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Serve the gateway until ctrl-c.
pub async fn start_gateway(state: Arc<GatewayState>, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    let lines = [
        format!("wabridge v{}", state.version),
        format!("listening on http://{local}"),
        format!(
            "api auth: {}",
            if state.auth_enabled() {
                "bearer token"
            } else {
                "disabled"
            }
        ),
        format!(
            "whatsapp: {}",
            if state.bridge.is_connected() {
                "connected"
            } else {
                "not connected"
            }
        ),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, build_gateway_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
        "connected": state.gateway.bridge.is_connected(),
    }))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{FakeClient, bridge, bridge_with, text_event},
        axum::{
            body::Body,
            http::{Request, StatusCode, header},
        },
        secrecy::Secret,
        serde_json::Value,
        tower::ServiceExt,
        wabridge_protocol::{ClientEvent, OutboundMessage},
    };

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn json_send(body: &str) -> Request<Body> {
        Request::post("/api/message/send")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_connection() {
        let (bridge, client) = bridge();
        client.connected.store(true, std::sync::atomic::Ordering::SeqCst);
        let app = build_gateway_app(GatewayState::new(bridge, None));

        let (status, body) = call(app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connected"], true);
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn last_message_is_404_when_empty() {
        let (bridge, _) = bridge();
        let app = build_gateway_app(GatewayState::new(bridge, None));
        let (status, _) = call(app, get_req("/api/message/last")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn last_message_returns_latest_event() {
        let (bridge, _) = bridge();
        bridge
            .handle_event(ClientEvent::Message(Box::new(text_event("first", "a"))))
            .await;
        bridge
            .handle_event(ClientEvent::Message(Box::new(text_event("second", "b"))))
            .await;
        let app = build_gateway_app(GatewayState::new(bridge, None));

        let (status, body) = call(app, get_req("/api/message/last")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["info"]["id"], "second");
        assert_eq!(body["message"]["conversation"], "b");
    }

    #[tokio::test]
    async fn sends_json_request() {
        let (bridge, client) = bridge();
        let app = build_gateway_app(GatewayState::new(bridge, None));

        let (status, body) = call(
            app,
            json_send(r#"{"receiver":"15551234567","message":"hello"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], true);

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.to_string(), "15551234567@s.whatsapp.net");
        assert_eq!(sent[0].1, OutboundMessage::text("hello"));
    }

    #[tokio::test]
    async fn sends_form_request() {
        let (bridge, client) = bridge();
        let app = build_gateway_app(GatewayState::new(bridge, None));

        let request = Request::post("/api/message/send")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("receiver=120363000000%40g.us&message=hi+all"))
            .unwrap();
        let (_, body) = call(app, request).await;
        assert_eq!(body["status"], true);
        assert_eq!(client.sent()[0].0.to_string(), "120363000000@g.us");
        assert_eq!(client.sent()[0].1, OutboundMessage::text("hi all"));
    }

    #[tokio::test]
    async fn failures_report_false_status() {
        let (bridge, client) = bridge();
        let app = build_gateway_app(GatewayState::new(bridge, None));
        let (status, body) = call(app.clone(), json_send("{not json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], false);

        let (_, body) = call(app, json_send(r#"{"receiver":"@domain","message":"x"}"#)).await;
        assert_eq!(body["status"], false);
        assert!(client.sent().is_empty());

        let (bridge, _) = bridge_with(FakeClient {
            fail_send: true,
            ..Default::default()
        });
        let app = build_gateway_app(GatewayState::new(bridge, None));
        let (_, body) = call(app, json_send(r#"{"receiver":"1555","message":"x"}"#)).await;
        assert_eq!(body["status"], false);
    }

    #[tokio::test]
    async fn api_requires_token_when_configured() {
        let (bridge, _) = bridge();
        let app = build_gateway_app(GatewayState::new(
            bridge,
            Some(Secret::new("s3cret".into())),
        ));

        let (status, _) = call(app.clone(), get_req("/api/message/last")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let wrong = Request::get("/api/message/last")
            .header(header::AUTHORIZATION, "Bearer nope")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(app.clone(), wrong).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let authed = Request::get("/api/message/last")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(app.clone(), authed).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Health stays public.
        let (status, _) = call(app, get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
