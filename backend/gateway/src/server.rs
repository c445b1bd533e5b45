//! Main HTTP gateway server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use tripforge_agent::FlowController;

use crate::{control_ui, health_api, itinerary_api, session_api};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub controller: Arc<FlowController>,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(controller: Arc<FlowController>) -> Self {
        Self {
            controller,
            started_at: Utc::now(),
        }
    }
}

/// Every route the gateway serves.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/health", get(health_api::get_health))
        .route("/api/session", post(session_api::create_session))
        .route(
            "/api/form/:session_id",
            get(session_api::get_form)
                .post(session_api::submit_form)
                .put(session_api::update_form),
        )
        .route("/api/chat", post(session_api::chat))
        .route("/api/messages/:session_id", get(session_api::get_messages))
        .route("/api/itinerary/:session_id", get(itinerary_api::get_itinerary))
        .route(
            "/api/itinerary/:session_id/versions",
            get(itinerary_api::list_versions),
        )
        .route(
            "/api/itinerary/:session_id/versions/:version",
            get(itinerary_api::get_version),
        )
        .route(
            "/api/itinerary/:session_id/report",
            get(itinerary_api::get_report),
        )
        .merge(control_ui::ui_router())
        .with_state(state)
}

/// Serve `router` on `addr` until ctrl-c.
#[instrument(skip(router))]
pub async fn start_server(addr: SocketAddr, router: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_support::{complete_form, state};

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_session_and_form_routes() {
        let (state, _) = state();
        let router = build_router(state);

        let (status, body) = send(&router, Method::POST, "/api/session", None).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["session_id"].as_str().unwrap().to_string();
        let form_uri = format!("/api/form/{id}");

        let (status, body) = send(&router, Method::GET, &form_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"]["filled"], 0);

        let (status, body) =
            send(&router, Method::PUT, &form_uri, Some(json!({"budget": "luxury"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form_status"]["filled_fields"]["budget"], "luxury");

        let (status, body) = send(&router, Method::POST, &form_uri, Some(complete_form())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["form_locked"], true);

        let (status, _) =
            send(&router, Method::PUT, &form_uri, Some(json!({"budget": "lavish"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_routes_and_sessions() {
        let (state, _) = state();
        let router = build_router(state);

        let (status, _) = send(&router, Method::GET, "/api/form/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&router, Method::DELETE, "/api/session", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        let (status, body) = send(&router, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "tripforge");
    }
}
