//! Dashboard page.

use axum::{response::Html, routing::get, Router};

use crate::server::GatewayState;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Serves the single-page dashboard at `/`.
pub fn ui_router() -> Router<GatewayState> {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
