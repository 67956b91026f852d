//! Database models
//!
//! Hierarchy nodes carry their ordered children directly; the db layer
//! assembles the tree after loading each level. Child vectors default to
//! empty under serde so freshly created nodes serialize cleanly.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::{TaskPriority, TaskStatus};

/// Production workflow category, names an ordered stage template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stages: Vec<CategoryStage>,
}

/// One entry in a category's ordered stage template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStage {
    pub guid: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub order_index: i64,
}

/// A content production project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub guid: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Determines the stage template materialized at creation; bulk task
    /// generation requires it
    pub category_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Workflow stage materialized for a project from its category template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub guid: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// Percentage contribution to stage-pool project progress (0-100)
    pub weight: f64,
    pub order_index: i64,
}

/// Grade, the top hierarchy level under a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grade {
    pub guid: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// Percentage contribution to project-level progress (0-100)
    pub weight: f64,
    pub order_index: i64,
    #[serde(default)]
    pub books: Vec<Book>,
}

/// Book within a grade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub guid: Uuid,
    pub grade_id: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// Unit within a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub guid: Uuid,
    pub book_id: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

/// Lesson, the leaf hierarchy level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub guid: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
}

/// A production task, anchored to one stage and at most one node per
/// hierarchy level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub guid: Uuid,
    pub project_id: Uuid,
    pub stage_id: Uuid,
    pub grade_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Derived from status via the canonical mapping unless explicitly
    /// overridden on update (0-100)
    pub progress: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub estimated_hours: f64,
    /// Opaque user id supplied by the auth collaborator
    pub created_by: Option<Uuid>,
}
