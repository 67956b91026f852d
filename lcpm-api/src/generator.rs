//! Bulk task generation orchestration
//!
//! Drives the generation run end to end: resolve the project's category,
//! load the ordered stages and the content tree, plan the (lowest unit ×
//! stage) cross product, then insert the planned tasks. A duplicate-key
//! rejection from the dedup index folds into the skipped list; any other
//! persistence error aborts the run. Re-running generation on an
//! unchanged project creates nothing.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use lcpm_common::db::models::Task;
use lcpm_common::events::{EventBus, LcpmEvent};
use lcpm_common::generate::{
    lowest_units, plan_generation, CreatedTask, GenerationSummary, SkippedTask,
    DEFAULT_DEADLINE_DAYS, DEFAULT_ESTIMATED_HOURS, SKIP_REASON_EXISTS,
};
use lcpm_common::{Error, Result, TaskPriority, TaskStatus};

use crate::db;

/// Run bulk task generation for a project
///
/// Always returns the structured summary on success, even when every
/// pair was skipped.
pub async fn generate_tasks(
    pool: &SqlitePool,
    events: &EventBus,
    project_id: Uuid,
    created_by: Option<Uuid>,
) -> Result<GenerationSummary> {
    // The project must exist and reference a resolvable category
    let project = db::projects::find_project(pool, project_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Project not found: {}", project_id)))?;
    let category_id = project
        .category_id
        .ok_or_else(|| Error::Validation("Project has no category".to_string()))?;
    if db::categories::find_category(pool, category_id)
        .await?
        .is_none()
    {
        return Err(Error::Validation(format!(
            "Category not found: {}",
            category_id
        )));
    }

    // Ordered stage list, materialized from the category template
    let stages = db::stages::list_stages(pool, project_id).await?;
    if stages.is_empty() {
        return Err(Error::Validation(
            "Project has no stages to generate tasks for".to_string(),
        ));
    }

    // Content tree and its lowest units
    let tree = db::hierarchy::load_tree(pool, project_id).await?;
    let units = lowest_units(&tree);
    if units.is_empty() {
        return Err(Error::Validation(
            "Project has no content hierarchy".to_string(),
        ));
    }

    // Plan the cross product against the existing dedup keys
    let existing = db::tasks::existing_task_keys(pool, project_id).await?;
    let plan = plan_generation(&units, &stages, &existing);

    info!(
        "Generating tasks for project {}: {} stages x {} lowest units, {} planned, {} already exist",
        project_id,
        plan.total_stages,
        plan.total_units,
        plan.to_create.len(),
        plan.skipped.len()
    );

    let today = Utc::now().date_naive();
    let end_date = project
        .end_date
        .unwrap_or_else(|| today + Duration::days(DEFAULT_DEADLINE_DAYS));

    let total_stages = plan.total_stages;
    let total_units = plan.total_units;
    let expected_tasks = plan.expected_tasks();
    let mut created = Vec::with_capacity(plan.to_create.len());
    let mut skipped = plan.skipped;

    for planned in plan.to_create {
        let task = Task {
            guid: Uuid::new_v4(),
            project_id,
            stage_id: planned.stage_id,
            grade_id: planned.key.grade_id,
            book_id: planned.key.book_id,
            unit_id: planned.key.unit_id,
            lesson_id: planned.key.lesson_id,
            name: planned.name.clone(),
            description: Some(planned.description),
            status: TaskStatus::NotStarted,
            priority: TaskPriority::Medium,
            progress: TaskStatus::NotStarted.progress_percent(),
            start_date: Some(today),
            end_date: Some(end_date),
            estimated_hours: DEFAULT_ESTIMATED_HOURS,
            created_by,
        };

        match db::tasks::insert_task(pool, &task).await {
            Ok(()) => created.push(CreatedTask {
                name: planned.name,
                component_path: planned.component_path,
                stage: planned.stage_name,
            }),
            // A concurrent run can win the race for the same key; the
            // dedup index rejects the insert and the pair counts as skipped
            Err(Error::Database(e)) if db::is_unique_violation(&e) => {
                warn!("Task already exists (concurrent insert): {}", planned.name);
                skipped.push(SkippedTask {
                    name: planned.name,
                    component_path: planned.component_path,
                    stage: planned.stage_name,
                    reason: SKIP_REASON_EXISTS.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let summary = GenerationSummary {
        total_stages,
        total_units,
        expected_tasks,
        created_count: created.len(),
        skipped_count: skipped.len(),
        created,
        skipped,
    };

    info!(
        "Generation finished for project {}: {} created, {} skipped",
        project_id, summary.created_count, summary.skipped_count
    );

    events.emit_lossy(LcpmEvent::TasksGenerated {
        project_id,
        created_count: summary.created_count,
        skipped_count: summary.skipped_count,
        timestamp: Utc::now(),
    });

    Ok(summary)
}
