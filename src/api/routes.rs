use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

use crate::registry::SharedRegistry;

use super::handlers::{
    click_link, create_link, delete_link, get_link, health_check, list_links, sweep_links,
    AppState,
};

pub fn create_api_router(
    registry: SharedRegistry,
    recent_limit: usize,
    create_delay: Duration,
) -> Router {
    let state = Arc::new(AppState {
        registry,
        recent_limit,
        create_delay,
    });

    let api_routes = Router::new()
        .route("/links", post(create_link).get(list_links))
        .route("/links/{code}", get(get_link).delete(delete_link))
        .route("/links/{code}/click", post(click_link))
        .route("/sweep", post(sweep_links))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
