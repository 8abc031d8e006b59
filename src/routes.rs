// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{quiz, usage},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Every `/api` route requires a bearer token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let quiz_routes = Router::new()
        .route("/{mode}", get(quiz::get_session))
        .route("/{mode}/start", post(quiz::start_game))
        .route("/{mode}/answer", post(quiz::submit_answer))
        .route("/{mode}/next", post(quiz::next_question))
        .route("/{mode}/reset", post(quiz::reset_game))
        .route("/{mode}/results", get(quiz::get_results))
        .route_layer(auth.clone());

    let usage_routes = Router::new()
        .route("/{feature}", get(usage::get_usage).post(usage::consume_usage))
        .route_layer(auth);

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/usage", usage_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
