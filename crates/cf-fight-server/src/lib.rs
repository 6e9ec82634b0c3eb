pub mod config;
pub mod error;
pub mod judge;
pub mod orchestrator;
pub mod routes;
pub mod state;
pub mod store;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::judge::Judge;
use crate::state::AppState;

/// Build a fully configured Router + shared state around the given judge.
pub fn build_app(config: Config, judge: Arc<dyn Judge>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, judge));
    (router(state.clone()), state)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/cf/validate-handle", get(routes::validate_handle))
        .route("/api/cf/solved", get(routes::solved))
        .route("/api/create-room", post(routes::create_room))
        .route("/api/join-room", post(routes::join_room))
        .route("/api/start-room", post(routes::start_room))
        .route("/api/room/{code}/status", get(routes::room_status))
        .route("/api/room/{code}/refresh-solves", post(routes::refresh_solves))
        .route("/api/solo-set", post(routes::solo_set))
        .route("/api/solo-refresh", post(routes::solo_refresh))
        .route("/api/solo/{id}/status", get(routes::solo_status))
        .fallback(routes::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
