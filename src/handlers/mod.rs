pub mod webhooks;

pub use webhooks::handle_webhook;

use axum::{
    routing::{get, post},
    Router,
};

use crate::db::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhooks::handle_webhook))
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
