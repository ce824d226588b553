use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Service endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Incident management
        .route(
            "/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route(
            "/incidents/",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route(
            "/incidents/:id",
            get(handlers::get_incident).delete(handlers::delete_incident),
        )
        .route("/incidents/:id/status", patch(handlers::update_status))
        .route(
            "/incidents/:id/description",
            patch(handlers::update_description),
        )
        // Add state
        .with_state(state)
        // Add middleware
        .route_layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}
