//! Category API endpoints
//!
//! A category is a production type (e.g. "Textbook Series") carrying an
//! ordered list of stage templates. Projects created under a category
//! materialize those templates as their own stages.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use lcpm_common::db::models::{Category, CategoryStage};
use lcpm_common::Error;

use crate::{db, ApiError, ApiResult, AppState};

/// Request payload for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered stage template names; order becomes order_index
    #[serde(default)]
    pub stages: Vec<String>,
}

/// POST /api/categories
pub async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Category name cannot be empty".to_string(),
        ));
    }
    if req.stages.iter().any(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "Stage template names cannot be empty".to_string(),
        ));
    }

    let guid = Uuid::new_v4();
    let stages = req
        .stages
        .into_iter()
        .enumerate()
        .map(|(i, name)| CategoryStage {
            guid: Uuid::new_v4(),
            category_id: guid,
            name,
            order_index: i as i64,
        })
        .collect();
    let category = Category {
        guid,
        name: req.name,
        description: req.description,
        stages,
    };

    match db::categories::insert_category(&state.db, &category).await {
        Ok(()) => {}
        Err(Error::Database(e)) if db::is_unique_violation(&e) => {
            return Err(ApiError::Conflict(format!(
                "Category name already exists: {}",
                category.name
            )));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Created category '{}' with {} stage templates",
        category.name,
        category.stages.len()
    );

    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let categories = db::categories::list_categories(&state.db).await?;
    Ok(Json(categories))
}
