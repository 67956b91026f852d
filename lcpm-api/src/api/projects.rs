//! Project API endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use lcpm_common::db::models::{Project, Stage};
use lcpm_common::progress::{self, ProjectProgress};
use lcpm_common::weights::distribute_evenly;

use crate::{db, ApiError, ApiResult, AppState};

/// Request payload for creating a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Category whose stage templates become the project's stages
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Created project with its materialized stages
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    pub stages: Vec<Stage>,
}

/// Project with its computed progress block
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub progress: ProjectProgress,
}

/// POST /api/projects
///
/// Creating a project under a category copies the category's stage
/// templates into project stages, with weights distributed evenly
/// (the first stage absorbs any rounding remainder).
pub async fn create_project(
    State(state): State<AppState>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Project name cannot be empty".to_string(),
        ));
    }

    // The referenced category must exist before we copy its templates
    let category = match req.category_id {
        Some(category_id) => Some(
            db::categories::find_category(&state.db, category_id)
                .await?
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Category not found: {}", category_id))
                })?,
        ),
        None => None,
    };

    let project = Project {
        guid: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        category_id: req.category_id,
        start_date: req.start_date,
        end_date: req.end_date,
    };
    db::projects::insert_project(&state.db, &project).await?;

    let mut stages = Vec::new();
    if let Some(category) = category {
        let weights = distribute_evenly(category.stages.len());
        for (template, weight) in category.stages.iter().zip(weights) {
            let stage = Stage {
                guid: Uuid::new_v4(),
                project_id: project.guid,
                name: template.name.clone(),
                weight: weight as f64,
                order_index: template.order_index,
            };
            db::stages::insert_stage(&state.db, &stage).await?;
            stages.push(stage);
        }
    }

    info!(
        "Created project '{}' with {} stages",
        project.name,
        stages.len()
    );

    Ok((StatusCode::CREATED, Json(ProjectResponse { project, stages })))
}

/// GET /api/projects/:id
///
/// Returns the project with both progress pools and the source actually
/// used for the overall figure.
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetail>> {
    let project = db::projects::find_project(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project not found: {}", project_id)))?;

    let stages = db::stages::list_stages(&state.db, project_id).await?;
    let tree = db::hierarchy::load_tree(&state.db, project_id).await?;
    let tasks = db::tasks::list_tasks(&state.db, project_id).await?;

    let progress = progress::project_progress(&tree, &stages, &tasks);

    Ok(Json(ProjectDetail { project, progress }))
}
