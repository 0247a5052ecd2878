//! Router assembly and cross-origin policy.

use super::handlers;
use crate::{
    config::WebOrigin,
    task::{ports::TaskRepository, services::TaskService},
};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, patch, put},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Builds the API router over `service`.
///
/// Every route is wrapped in `cors` and an HTTP trace layer.
pub fn router<R>(service: TaskService<R>, cors: CorsLayer) -> Router
where
    R: TaskRepository + 'static,
{
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/tarefas",
            get(handlers::list_tasks::<R>).post(handlers::create_task::<R>),
        )
        .route(
            "/api/tarefas/{id}",
            put(handlers::update_task::<R>).delete(handlers::delete_task::<R>),
        )
        .route("/api/tarefas/{id}/mover", patch(handlers::move_task::<R>))
        .with_state(service)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Builds the CORS policy for the configured origins.
///
/// Any method and header are allowed. Origins that are not valid header
/// values are skipped with a warning.
#[must_use]
pub fn cors_layer(origin: &WebOrigin) -> CorsLayer {
    let allowed = match origin {
        WebOrigin::Any => AllowOrigin::any(),
        WebOrigin::Exact(origins) => AllowOrigin::list(origins.iter().filter_map(|entry| {
            HeaderValue::from_str(entry)
                .inspect_err(|err| warn!(origin = %entry, error = %err, "ignoring invalid origin"))
                .ok()
        })),
    };
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
