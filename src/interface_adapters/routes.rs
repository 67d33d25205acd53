use crate::interface_adapters::handlers::{invitation_events, page_shell, search_guests};
use crate::interface_adapters::state::AppState;
use axum::{Router, routing::get};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    // Wire the HTTP routes to their handlers.
    Router::new()
        .route("/", get(page_shell))
        .route("/invitation/events", get(invitation_events))
        .route("/guests/search", get(search_guests))
        .with_state(state)
}
