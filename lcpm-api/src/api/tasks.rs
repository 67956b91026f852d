//! Task API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lcpm_common::db::models::Task;
use lcpm_common::events::LcpmEvent;
use lcpm_common::{Error, TaskPriority, TaskStatus};

use crate::{db, ApiError, ApiResult, AppState};

/// GET /api/projects/:id/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    if db::projects::find_project(&state.db, project_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Project not found: {}",
            project_id
        )));
    }

    let tasks = db::tasks::list_tasks(&state.db, project_id).await?;
    Ok(Json(tasks))
}

/// Request payload for creating a task
///
/// Progress is not accepted here; it is derived from the status via the
/// status-to-progress mapping.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub project_id: Uuid,
    pub stage_id: Uuid,
    #[serde(default)]
    pub grade_id: Option<Uuid>,
    #[serde(default)]
    pub book_id: Option<Uuid>,
    #[serde(default)]
    pub unit_id: Option<Uuid>,
    #[serde(default)]
    pub lesson_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    /// Opaque author id; no authentication protocol behind it
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Task name cannot be empty".to_string()));
    }
    let estimated_hours = req.estimated_hours.unwrap_or(0.0);
    if estimated_hours < 0.0 {
        return Err(ApiError::BadRequest(
            "Estimated hours cannot be negative".to_string(),
        ));
    }

    if db::projects::find_project(&state.db, req.project_id)
        .await?
        .is_none()
    {
        return Err(ApiError::BadRequest(format!(
            "Project not found: {}",
            req.project_id
        )));
    }
    let stages = db::stages::list_stages(&state.db, req.project_id).await?;
    if !stages.iter().any(|s| s.guid == req.stage_id) {
        return Err(ApiError::BadRequest(format!(
            "Stage {} does not belong to project {}",
            req.stage_id, req.project_id
        )));
    }

    let status = req.status.unwrap_or_default();
    let task = Task {
        guid: Uuid::new_v4(),
        project_id: req.project_id,
        stage_id: req.stage_id,
        grade_id: req.grade_id,
        book_id: req.book_id,
        unit_id: req.unit_id,
        lesson_id: req.lesson_id,
        name: req.name,
        description: req.description,
        status,
        priority: req.priority.unwrap_or_default(),
        progress: status.progress_percent(),
        start_date: req.start_date,
        end_date: req.end_date,
        estimated_hours,
        created_by: req.created_by,
    };

    match db::tasks::insert_task(&state.db, &task).await {
        Ok(()) => {}
        Err(Error::Database(e)) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "A task already exists at these hierarchy coordinates".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    info!("Created task '{}'", task.name);

    state.events.emit_lossy(LcpmEvent::TaskCreated {
        task_id: task.guid,
        project_id: task.project_id,
        timestamp: Utc::now(),
    });

    Ok((StatusCode::CREATED, Json(task)))
}

/// Request payload for updating a task; absent fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    /// Explicit progress wins over the status mapping
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
}

/// PATCH /api/tasks/:id
///
/// A status change without an explicit progress recomputes progress
/// from the new status.
pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let mut task = db::tasks::find_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    if let Some(progress) = req.progress {
        if !(0..=100).contains(&progress) {
            return Err(ApiError::BadRequest(format!(
                "Progress must be between 0 and 100, got {}",
                progress
            )));
        }
    }
    if let Some(hours) = req.estimated_hours {
        if hours < 0.0 {
            return Err(ApiError::BadRequest(
                "Estimated hours cannot be negative".to_string(),
            ));
        }
    }
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Task name cannot be empty".to_string()));
        }
    }

    if let Some(name) = req.name {
        task.name = name;
    }
    if let Some(description) = req.description {
        task.description = Some(description);
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    if let Some(start_date) = req.start_date {
        task.start_date = Some(start_date);
    }
    if let Some(end_date) = req.end_date {
        task.end_date = Some(end_date);
    }
    if let Some(hours) = req.estimated_hours {
        task.estimated_hours = hours;
    }

    match (req.status, req.progress) {
        (Some(status), Some(progress)) => {
            task.status = status;
            task.progress = progress;
        }
        (Some(status), None) => {
            task.status = status;
            task.progress = status.progress_percent();
        }
        (None, Some(progress)) => {
            task.progress = progress;
        }
        (None, None) => {}
    }

    db::tasks::update_task(&state.db, &task).await?;

    state.events.emit_lossy(LcpmEvent::TaskUpdated {
        task_id: task.guid,
        project_id: task.project_id,
        timestamp: Utc::now(),
    });

    Ok(Json(task))
}

/// DELETE /api/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let task = db::tasks::find_task(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Task not found: {}", task_id)))?;

    db::tasks::delete_task(&state.db, task_id).await?;

    info!("Deleted task '{}'", task.name);

    state.events.emit_lossy(LcpmEvent::TaskDeleted {
        task_id: task.guid,
        project_id: task.project_id,
        timestamp: Utc::now(),
    });

    Ok(StatusCode::NO_CONTENT)
}
