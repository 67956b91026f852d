//! Bulk task generation endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use lcpm_common::generate::GenerationSummary;

use crate::{generator, ApiResult, AppState};

/// Optional request payload for bulk generation
#[derive(Debug, Default, Deserialize)]
pub struct BulkCreateTasksRequest {
    /// Opaque author id stamped on every created task
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// POST /api/projects/:id/bulk-create-tasks
///
/// Generates one task per (lowest unit × stage) pair that does not
/// already have one. Safe to call repeatedly; existing pairs are
/// reported as skipped.
pub async fn bulk_create_tasks(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    body: Option<Json<BulkCreateTasksRequest>>,
) -> ApiResult<Json<GenerationSummary>> {
    let created_by = body.map(|Json(req)| req.created_by).unwrap_or(None);

    let summary =
        generator::generate_tasks(&state.db, &state.events, project_id, created_by).await?;

    Ok(Json(summary))
}
