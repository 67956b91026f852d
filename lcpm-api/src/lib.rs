//! lcpm-api library - Learning Content Production Manager HTTP service
//!
//! Serves the production-management API: categories and stage templates,
//! projects, the grade/book/unit/lesson hierarchy, tasks, weighted progress
//! rollups, and bulk task generation.

use axum::Router;
use sqlx::SqlitePool;

use lcpm_common::events::EventBus;

pub mod api;
pub mod db;
pub mod error;
pub mod generator;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE fan-out
    pub events: EventBus,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, events: EventBus) -> Self {
        Self { db, events }
    }
}

/// Build application router
///
/// Hierarchy-level routes (`/api/:level/...`) share handlers; the level
/// segment is validated against the known levels inside the handler, so
/// static routes like `/api/tasks` keep priority over the dynamic match.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, patch, post};
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;

    Router::new()
        .merge(api::health_routes())
        .route("/api/events", get(api::event_stream))
        // Categories and their stage templates
        .route(
            "/api/categories",
            post(api::create_category).get(api::list_categories),
        )
        // Projects
        .route("/api/projects", post(api::create_project))
        .route("/api/projects/:id", get(api::get_project))
        .route("/api/projects/:id/hierarchy", get(api::get_hierarchy))
        .route("/api/projects/:id/stages", get(api::list_stages))
        .route("/api/projects/:id/tasks", get(api::list_tasks))
        .route(
            "/api/projects/:id/bulk-create-tasks",
            post(api::bulk_create_tasks),
        )
        // Tasks
        .route("/api/tasks", post(api::create_task))
        .route(
            "/api/tasks/:id",
            patch(api::update_task).delete(api::delete_task),
        )
        // Hierarchy nodes (grades, books, units, lessons)
        .route("/api/:level", post(api::create_node))
        .route("/api/:level/:id", delete(api::delete_node))
        .route(
            "/api/:level/distribute-weights",
            post(api::distribute_weights),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for the cross-origin front end
        .layer(CorsLayer::permissive())
}
