//! HTTP API handlers for lcpm-api

pub mod categories;
pub mod generate;
pub mod health;
pub mod hierarchy;
pub mod projects;
pub mod sse;
pub mod stages;
pub mod tasks;

pub use categories::{create_category, list_categories};
pub use generate::bulk_create_tasks;
pub use health::health_routes;
pub use hierarchy::{create_node, delete_node, distribute_weights, get_hierarchy};
pub use projects::{create_project, get_project};
pub use sse::event_stream;
pub use stages::list_stages;
pub use tasks::{create_task, delete_task, list_tasks, update_task};
