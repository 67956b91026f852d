//! Content hierarchy endpoints
//!
//! One set of handlers serves all four levels (grades, books, units,
//! lessons); the level arrives as a path segment and is validated against
//! HierarchyLevel before any query runs.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use lcpm_common::db::models::{Book, Grade, Lesson, Task, Unit};
use lcpm_common::events::LcpmEvent;
use lcpm_common::progress::{
    book_progress, grade_progress, hierarchy_rollup, lesson_progress, unit_progress,
};
use lcpm_common::weights::{distribute_evenly, validate_weights};

use crate::db::hierarchy::{HierarchyLevel, HierarchyNode};
use crate::{db, ApiError, ApiResult, AppState};

fn parse_level(segment: &str) -> Result<HierarchyLevel, ApiError> {
    HierarchyLevel::from_path_segment(segment)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown hierarchy level: {}", segment)))
}

// ===== Tree view =====

/// Full annotated tree for a project
#[derive(Debug, Serialize)]
pub struct HierarchyResponse {
    pub grades: Vec<GradeView>,
    /// Verdict on the grade weight set
    pub weights_valid: bool,
    /// Hierarchy-pool progress for the whole project
    pub progress: i64,
}

#[derive(Debug, Serialize)]
pub struct GradeView {
    pub guid: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    pub progress: i64,
    /// Verdict on this grade's book weight set
    pub weights_valid: bool,
    pub books: Vec<BookView>,
}

#[derive(Debug, Serialize)]
pub struct BookView {
    pub guid: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    pub progress: i64,
    pub weights_valid: bool,
    pub units: Vec<UnitView>,
}

#[derive(Debug, Serialize)]
pub struct UnitView {
    pub guid: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    pub progress: i64,
    pub weights_valid: bool,
    pub lessons: Vec<LessonView>,
}

#[derive(Debug, Serialize)]
pub struct LessonView {
    pub guid: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
    pub progress: i64,
}

fn lesson_view(lesson: &Lesson, tasks: &[Task]) -> LessonView {
    LessonView {
        guid: lesson.guid,
        name: lesson.name.clone(),
        weight: lesson.weight,
        order_index: lesson.order_index,
        progress: lesson_progress(lesson.guid, tasks).progress,
    }
}

fn unit_view(unit: &Unit, tasks: &[Task]) -> UnitView {
    let weights: Vec<f64> = unit.lessons.iter().map(|l| l.weight).collect();
    UnitView {
        guid: unit.guid,
        name: unit.name.clone(),
        weight: unit.weight,
        order_index: unit.order_index,
        progress: unit_progress(unit, tasks).progress,
        weights_valid: validate_weights(&weights),
        lessons: unit.lessons.iter().map(|l| lesson_view(l, tasks)).collect(),
    }
}

fn book_view(book: &Book, tasks: &[Task]) -> BookView {
    let weights: Vec<f64> = book.units.iter().map(|u| u.weight).collect();
    BookView {
        guid: book.guid,
        name: book.name.clone(),
        weight: book.weight,
        order_index: book.order_index,
        progress: book_progress(book, tasks).progress,
        weights_valid: validate_weights(&weights),
        units: book.units.iter().map(|u| unit_view(u, tasks)).collect(),
    }
}

fn grade_view(grade: &Grade, tasks: &[Task]) -> GradeView {
    let weights: Vec<f64> = grade.books.iter().map(|b| b.weight).collect();
    GradeView {
        guid: grade.guid,
        name: grade.name.clone(),
        weight: grade.weight,
        order_index: grade.order_index,
        progress: grade_progress(grade, tasks).progress,
        weights_valid: validate_weights(&weights),
        books: grade.books.iter().map(|b| book_view(b, tasks)).collect(),
    }
}

/// GET /api/projects/:id/hierarchy
pub async fn get_hierarchy(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<HierarchyResponse>> {
    if db::projects::find_project(&state.db, project_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Project not found: {}",
            project_id
        )));
    }

    let tree = db::hierarchy::load_tree(&state.db, project_id).await?;
    let tasks = db::tasks::list_tasks(&state.db, project_id).await?;

    let grade_weights: Vec<f64> = tree.iter().map(|g| g.weight).collect();
    let response = HierarchyResponse {
        weights_valid: validate_weights(&grade_weights),
        progress: hierarchy_rollup(&tree, &tasks).progress,
        grades: tree.iter().map(|g| grade_view(g, &tasks)).collect(),
    };

    Ok(Json(response))
}

// ===== Node creation and deletion =====

/// Request payload for creating a hierarchy node
#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    /// Project guid for grades; parent node guid for deeper levels
    pub parent_id: Uuid,
    pub name: String,
    /// Percentage weight among siblings; defaults to 0
    #[serde(default)]
    pub weight: Option<f64>,
    /// Defaults to the next free slot under the parent
    #[serde(default)]
    pub order_index: Option<i64>,
}

/// POST /api/:level
pub async fn create_node(
    State(state): State<AppState>,
    Path(level): Path<String>,
    Json(req): Json<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<HierarchyNode>)> {
    let level = parse_level(&level)?;

    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Node name cannot be empty".to_string()));
    }
    let weight = req.weight.unwrap_or(0.0);
    if !(0.0..=100.0).contains(&weight) {
        return Err(ApiError::BadRequest(format!(
            "Weight must be between 0 and 100, got {}",
            weight
        )));
    }

    // The parent chain must reach a project
    if db::hierarchy::project_id_for_parent(&state.db, level, req.parent_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Parent not found for {}: {}",
            level, req.parent_id
        )));
    }

    let order_index = match req.order_index {
        Some(idx) => idx,
        None => db::hierarchy::next_order_index(&state.db, level, req.parent_id).await?,
    };

    let node = HierarchyNode {
        guid: Uuid::new_v4(),
        parent_id: req.parent_id,
        name: req.name,
        weight,
        order_index,
    };
    db::hierarchy::insert_node(&state.db, level, &node).await?;

    info!("Created {} node '{}'", level, node.name);

    Ok((StatusCode::CREATED, Json(node)))
}

/// DELETE /api/:level/:id
///
/// Refused while child nodes exist. Tasks anchored at the node do not
/// block deletion; they cascade with it.
pub async fn delete_node(
    State(state): State<AppState>,
    Path((level, id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    let level = parse_level(&level)?;

    if !db::hierarchy::node_exists(&state.db, level, id).await? {
        return Err(ApiError::NotFound(format!("Node not found: {}", id)));
    }
    if db::hierarchy::has_children(&state.db, level, id).await? {
        return Err(ApiError::BadRequest(format!(
            "Cannot delete {} node {}: child nodes exist",
            level, id
        )));
    }

    db::hierarchy::delete_node(&state.db, level, id).await?;

    info!("Deleted {} node {}", level, id);

    Ok(StatusCode::NO_CONTENT)
}

// ===== Weight distribution =====

/// Request payload for even weight distribution
#[derive(Debug, Deserialize)]
pub struct DistributeWeightsRequest {
    /// Project guid for grades; parent node guid for deeper levels
    pub parent_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DistributedWeight {
    pub guid: Uuid,
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct DistributeWeightsResponse {
    pub level: HierarchyLevel,
    pub parent_id: Uuid,
    pub weights: Vec<DistributedWeight>,
}

/// POST /api/:level/distribute-weights
///
/// Overwrites the sibling weights under the parent scope with an even
/// split; the first sibling in order_index order absorbs the remainder.
pub async fn distribute_weights(
    State(state): State<AppState>,
    Path(level): Path<String>,
    Json(req): Json<DistributeWeightsRequest>,
) -> ApiResult<Json<DistributeWeightsResponse>> {
    let level = parse_level(&level)?;

    let project_id = db::hierarchy::project_id_for_parent(&state.db, level, req.parent_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Parent not found for {}: {}", level, req.parent_id))
        })?;

    let siblings = db::hierarchy::list_siblings(&state.db, level, req.parent_id).await?;
    let new_weights = distribute_evenly(siblings.len());

    let updates: Vec<(Uuid, f64)> = siblings
        .iter()
        .zip(&new_weights)
        .map(|(node, w)| (node.guid, *w as f64))
        .collect();
    db::hierarchy::update_weights(&state.db, level, &updates).await?;

    if !siblings.is_empty() {
        state.events.emit_lossy(LcpmEvent::WeightsDistributed {
            project_id,
            level: level.to_string(),
            sibling_count: siblings.len(),
            timestamp: Utc::now(),
        });
        info!(
            "Distributed weights across {} {} under {}",
            siblings.len(),
            level,
            req.parent_id
        );
    }

    let weights = siblings
        .into_iter()
        .zip(new_weights)
        .map(|(node, w)| DistributedWeight {
            guid: node.guid,
            name: node.name,
            weight: w as f64,
        })
        .collect();

    Ok(Json(DistributeWeightsResponse {
        level,
        parent_id: req.parent_id,
        weights,
    }))
}
