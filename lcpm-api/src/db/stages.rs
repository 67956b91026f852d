//! Project stage database operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lcpm_common::db::models::Stage;
use lcpm_common::Result;

use super::parse_guid;

pub async fn insert_stage(pool: &SqlitePool, stage: &Stage) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO stages (guid, project_id, name, weight, order_index)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(stage.guid.to_string())
    .bind(stage.project_id.to_string())
    .bind(&stage.name)
    .bind(stage.weight)
    .bind(stage.order_index)
    .execute(pool)
    .await?;

    Ok(())
}

/// List a project's stages in template order
pub async fn list_stages(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Stage>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, project_id, name, weight, order_index
        FROM stages
        WHERE project_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(Stage {
                guid: parse_guid(&row.get::<String, _>("guid"), "stages.guid")?,
                project_id: parse_guid(&row.get::<String, _>("project_id"), "stages.project_id")?,
                name: row.get("name"),
                weight: row.get("weight"),
                order_index: row.get("order_index"),
            })
        })
        .collect()
}
