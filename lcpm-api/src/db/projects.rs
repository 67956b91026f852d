//! Project database operations

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lcpm_common::db::models::Project;
use lcpm_common::Result;

use super::{parse_guid, parse_guid_opt};

pub async fn insert_project(pool: &SqlitePool, project: &Project) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO projects (guid, name, description, category_id, start_date, end_date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project.guid.to_string())
    .bind(&project.name)
    .bind(&project.description)
    .bind(project.category_id.map(|id| id.to_string()))
    .bind(project.start_date)
    .bind(project.end_date)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_project(pool: &SqlitePool, project_id: Uuid) -> Result<Option<Project>> {
    let row = sqlx::query(
        r#"
        SELECT guid, name, description, category_id, start_date, end_date
        FROM projects
        WHERE guid = ?
        "#,
    )
    .bind(project_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(Project {
            guid: parse_guid(&row.get::<String, _>("guid"), "projects.guid")?,
            name: row.get("name"),
            description: row.get("description"),
            category_id: parse_guid_opt(row.get("category_id"), "projects.category_id")?,
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
        })),
        None => Ok(None),
    }
}
