use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod events;
mod observability;
mod photos;
mod profile;
mod public;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    // Leave headroom over the per-file ceiling for multipart framing, so the
    // size verdict comes from validation rather than the transport layer.
    let body_limit = usize::try_from(state.shared.config.quota.max_file_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);

    let api_router = Router::new()
        .merge(host_router(state.clone()))
        .nest("/admin", admin_router(state.clone()))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/signin", post(auth::signin))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/signout", post(auth::signout))
        .nest("/public", public_router())
        .route("/health", get(observability::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes requiring a verified host account.
fn host_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(profile::get_profile))
        .route("/me", patch(profile::update_profile))
        .route("/me/avatar", post(profile::upload_avatar))
        .route("/events", post(events::create_event))
        .route("/events", get(events::list_events))
        .route("/events/actions/bulk", post(events::bulk_actions))
        .route("/events/{id}", get(events::get_event))
        .route("/events/{id}", patch(events::update_event))
        .route("/events/{id}", delete(events::delete_event))
        .route("/events/{id}/cover", post(events::upload_cover))
        .route("/events/{id}/photos", get(photos::list_photos))
        .route(
            "/events/{id}/photos/bulk-delete",
            post(photos::bulk_delete_photos),
        )
        .route(
            "/events/{id}/photos/{photo_id}",
            patch(photos::update_photo),
        )
        .route(
            "/events/{id}/photos/{photo_id}",
            delete(photos::delete_photo),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Routes additionally requiring the admin flag.
fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/overview", get(admin::get_overview))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", get(admin::inspect_user))
        .route("/users/{id}/status", patch(admin::update_user_status))
        .route("/events", get(admin::list_events))
        .route("/events/{id}", get(admin::inspect_event))
        .route("/events/{id}/status", patch(admin::update_event_status))
        .route("/events/{id}", delete(admin::force_delete_event))
        .route("/uploads/recent", get(admin::recent_uploads))
        .route("/logs", get(admin::get_logs))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Visitor routes, reachable without authentication.
fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events/{slug}", get(public::get_event_card))
        .route("/events/{slug}/photos", get(public::list_event_photos))
        .route(
            "/events/{slug}/verify-password",
            post(public::verify_event_password),
        )
        .route("/events/{slug}/photos", post(public::upload_photo))
}
