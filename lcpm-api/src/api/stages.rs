//! Stage listing endpoint
//!
//! Stages are created by project creation (from the category template);
//! this module only reads them back with computed progress.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use lcpm_common::db::models::Stage;
use lcpm_common::progress::stage_progress;
use lcpm_common::weights::validate_weights;

use crate::{db, ApiError, ApiResult, AppState};

/// One stage with its task-derived progress
#[derive(Debug, Serialize)]
pub struct StageWithProgress {
    #[serde(flatten)]
    pub stage: Stage,
    pub progress: i64,
}

/// Stage listing with a validity verdict for the sibling weight set
#[derive(Debug, Serialize)]
pub struct StageListResponse {
    pub stages: Vec<StageWithProgress>,
    pub weights_valid: bool,
}

/// GET /api/projects/:id/stages
pub async fn list_stages(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<StageListResponse>> {
    if db::projects::find_project(&state.db, project_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound(format!(
            "Project not found: {}",
            project_id
        )));
    }

    let stages = db::stages::list_stages(&state.db, project_id).await?;
    let tasks = db::tasks::list_tasks(&state.db, project_id).await?;

    let weights: Vec<f64> = stages.iter().map(|s| s.weight).collect();
    let weights_valid = validate_weights(&weights);

    let stages = stages
        .into_iter()
        .map(|stage| {
            let progress = stage_progress(stage.guid, &tasks).progress;
            StageWithProgress { stage, progress }
        })
        .collect();

    Ok(Json(StageListResponse {
        stages,
        weights_valid,
    }))
}
