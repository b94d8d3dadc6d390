//! REST API routes and handlers.
//!
//! Every route except `/health` requires a bearer token.

mod dependencies;
mod tasks;
pub mod types;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::routing::{delete, get, patch, post};
use taskboard::domain::User;

use crate::auth::AuthUser;
use crate::state::AppState;
use types::{ApiResponse, HealthResponse};

/// Create the API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        // Tasks
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{task}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/tasks/{task}/status", patch(tasks::update_status))
        // Dependencies
        .route(
            "/dependencies",
            post(dependencies::add_dependency).delete(dependencies::remove_dependency),
        )
        .route(
            "/tasks/{task}/dependencies",
            get(dependencies::task_dependencies).delete(dependencies::clear_dependencies),
        )
        .route(
            "/tasks/{task}/dependencies/{dependency}",
            delete(dependencies::remove_dependency_by_id),
        )
        .route("/tasks/{task}/dependents", get(dependencies::task_dependents))
        .route(
            "/tasks/{task}/dependency-graph",
            get(dependencies::dependency_graph),
        )
}

/// Liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The authenticated user.
async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}
