use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{handlers, middleware, openapi::ApiDoc};

pub fn build_router(state: Arc<crate::AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origin
                .parse::<HeaderValue>()
                .expect("ALLOWED_ORIGIN is not a valid origin"),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Swap workflow routes. Static segments come before /{id} so they are
    // not shadowed.
    let swap_routes = Router::new()
        .route("/", post(handlers::swaps_handler::create_swap_request))
        .route("/", get(handlers::swaps_handler::get_swap_requests))
        .route("/my", get(handlers::swaps_handler::get_my_requests))
        .route("/incoming", get(handlers::swaps_handler::get_incoming_requests))
        .route("/approvals", get(handlers::swaps_handler::get_approval_requests))
        .route("/dashboard", get(handlers::swaps_handler::get_dashboard))
        .route("/shared/{token}", get(handlers::swaps_handler::get_shared_request))
        .route("/{id}", get(handlers::swaps_handler::get_swap_request))
        .route("/{id}", delete(handlers::swaps_handler::cancel_swap_request))
        .route("/{id}/respond", post(handlers::swaps_handler::respond_to_swap_request))
        .route("/{id}/decision", post(handlers::swaps_handler::decide_swap_request))
        .route("/{id}/link", post(handlers::swaps_handler::create_share_link));

    // Shift routes
    let shift_routes = Router::new().route(
        "/swappable",
        get(handlers::shifts_handler::get_swappable_shifts),
    );

    // Staff routes
    let staff_routes = Router::new().route("/", get(handlers::staff_handler::get_staff_list));

    // Ops-only metrics endpoint
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_ops_key,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(metrics_routes)
        .nest("/api/swaps", swap_routes)
        .nest("/api/shifts", shift_routes)
        .nest("/api/staff", staff_routes)
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::request_id_middleware))
                .layer(axum_middleware::from_fn(middleware::metrics_middleware))
                .layer(cors),
        )
        .with_state(state)
}
