use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/accept_webhook", post(handlers::accept_webhook))
        .route("/get_name", get(handlers::get_name))
        .route("/get_history", get(handlers::get_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
