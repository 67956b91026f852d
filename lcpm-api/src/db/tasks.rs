//! Task database operations

use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use uuid::Uuid;

use lcpm_common::db::models::Task;
use lcpm_common::generate::TaskKey;
use lcpm_common::{Error, Result, TaskPriority, TaskStatus};

use super::{parse_guid, parse_guid_opt};

pub async fn insert_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tasks (
            guid, project_id, stage_id, grade_id, book_id, unit_id, lesson_id,
            name, description, status, priority, progress,
            start_date, end_date, estimated_hours, created_by
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.guid.to_string())
    .bind(task.project_id.to_string())
    .bind(task.stage_id.to_string())
    .bind(task.grade_id.map(|id| id.to_string()))
    .bind(task.book_id.map(|id| id.to_string()))
    .bind(task.unit_id.map(|id| id.to_string()))
    .bind(task.lesson_id.map(|id| id.to_string()))
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.status.to_db_string())
    .bind(task.priority.to_db_string())
    .bind(task.progress)
    .bind(task.start_date)
    .bind(task.end_date)
    .bind(task.estimated_hours)
    .bind(task.created_by.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_task(pool: &SqlitePool, task_id: Uuid) -> Result<Option<Task>> {
    let row = sqlx::query(
        r#"
        SELECT guid, project_id, stage_id, grade_id, book_id, unit_id, lesson_id,
               name, description, status, priority, progress,
               start_date, end_date, estimated_hours, created_by
        FROM tasks
        WHERE guid = ?
        "#,
    )
    .bind(task_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(task_from_row).transpose()
}

/// List a project's tasks in creation order
pub async fn list_tasks(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Task>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, project_id, stage_id, grade_id, book_id, unit_id, lesson_id,
               name, description, status, priority, progress,
               start_date, end_date, estimated_hours, created_by
        FROM tasks
        WHERE project_id = ?
        ORDER BY created_at, guid
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(task_from_row).collect()
}

/// Persist every mutable field of a task, bumping updated_at
pub async fn update_task(pool: &SqlitePool, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE tasks SET
            name = ?, description = ?, status = ?, priority = ?, progress = ?,
            start_date = ?, end_date = ?, estimated_hours = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(task.status.to_db_string())
    .bind(task.priority.to_db_string())
    .bind(task.progress)
    .bind(task.start_date)
    .bind(task.end_date)
    .bind(task.estimated_hours)
    .bind(task.guid.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete_task(pool: &SqlitePool, task_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tasks WHERE guid = ?")
        .bind(task_id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Dedup keys of every existing task in a project
pub async fn existing_task_keys(pool: &SqlitePool, project_id: Uuid) -> Result<HashSet<TaskKey>> {
    let rows = sqlx::query(
        r#"
        SELECT grade_id, book_id, unit_id, lesson_id, stage_id
        FROM tasks
        WHERE project_id = ?
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut keys = HashSet::with_capacity(rows.len());
    for row in rows {
        keys.insert(TaskKey {
            grade_id: parse_guid_opt(row.get("grade_id"), "tasks.grade_id")?,
            book_id: parse_guid_opt(row.get("book_id"), "tasks.book_id")?,
            unit_id: parse_guid_opt(row.get("unit_id"), "tasks.unit_id")?,
            lesson_id: parse_guid_opt(row.get("lesson_id"), "tasks.lesson_id")?,
            stage_id: parse_guid(&row.get::<String, _>("stage_id"), "tasks.stage_id")?,
        });
    }

    Ok(keys)
}

fn task_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let status: String = row.get("status");
    let status = TaskStatus::from_str(&status)
        .ok_or_else(|| Error::Internal(format!("Unknown task status in database: {}", status)))?;

    let priority: String = row.get("priority");
    let priority = TaskPriority::from_str(&priority).ok_or_else(|| {
        Error::Internal(format!("Unknown task priority in database: {}", priority))
    })?;

    Ok(Task {
        guid: parse_guid(&row.get::<String, _>("guid"), "tasks.guid")?,
        project_id: parse_guid(&row.get::<String, _>("project_id"), "tasks.project_id")?,
        stage_id: parse_guid(&row.get::<String, _>("stage_id"), "tasks.stage_id")?,
        grade_id: parse_guid_opt(row.get("grade_id"), "tasks.grade_id")?,
        book_id: parse_guid_opt(row.get("book_id"), "tasks.book_id")?,
        unit_id: parse_guid_opt(row.get("unit_id"), "tasks.unit_id")?,
        lesson_id: parse_guid_opt(row.get("lesson_id"), "tasks.lesson_id")?,
        name: row.get("name"),
        description: row.get("description"),
        status,
        priority,
        progress: row.get("progress"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        estimated_hours: row.get("estimated_hours"),
        created_by: parse_guid_opt(row.get("created_by"), "tasks.created_by")?,
    })
}
