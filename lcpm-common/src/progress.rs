//! Weighted hierarchical progress aggregation
//!
//! Progress flows bottom-up: tasks average into lessons and stages, then
//! one generic weighted roll-up carries lessons → units → books → grades.
//! Project progress reads from a single pool at a time: the grade hierarchy
//! when the project has one, the stage list otherwise.
//!
//! Weights are trusted as given. A child set whose weights do not sum to
//! 100 skews the parent's percentage instead of being re-normalized here;
//! `total_weight` and the `weights_valid` flags in API responses surface
//! the problem, and the distribute-weights operations repair it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Book, Grade, Stage, Task, Unit};

/// Result of one aggregation step
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rollup {
    /// Rounded progress percentage (0-100 when weights are healthy)
    pub progress: i64,
    /// Weighted sum of child progress: Σ child progress × weight / 100
    pub completed_weight: f64,
    /// Σ child weights; 100 indicates a healthy weight set
    pub total_weight: f64,
}

impl Rollup {
    /// Roll-up of an empty child set
    pub fn empty() -> Self {
        Rollup {
            progress: 0,
            completed_weight: 0.0,
            total_weight: 0.0,
        }
    }
}

/// Generic weighted roll-up over (progress, weight) child pairs
///
/// progress = round(Σ child progress × weight / 100) when any weight is
/// present, 0 otherwise. Every hierarchy level above the leaves is an
/// instance of this function.
pub fn rollup<I>(children: I) -> Rollup
where
    I: IntoIterator<Item = (i64, f64)>,
{
    let mut completed_weight = 0.0;
    let mut total_weight = 0.0;
    for (progress, weight) in children {
        completed_weight += progress as f64 * weight / 100.0;
        total_weight += weight;
    }

    let progress = if total_weight > 0.0 {
        completed_weight.round() as i64
    } else {
        0
    };

    Rollup {
        progress,
        completed_weight,
        total_weight,
    }
}

/// Mean task progress, rounded; 0 when the iterator is empty
fn task_average<'a, I>(tasks: I) -> i64
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut sum: i64 = 0;
    let mut count: i64 = 0;
    for task in tasks {
        sum += task.progress;
        count += 1;
    }
    if count == 0 {
        0
    } else {
        (sum as f64 / count as f64).round() as i64
    }
}

/// Leaf roll-up shared by lessons and stages: the mean of matching task
/// progress, presented with a nominal total_weight of 100
fn leaf_rollup(progress: i64) -> Rollup {
    Rollup {
        progress,
        completed_weight: progress as f64,
        total_weight: 100.0,
    }
}

/// Progress of a lesson: mean progress of its tasks, 0 when it has none
pub fn lesson_progress(lesson_id: Uuid, tasks: &[Task]) -> Rollup {
    leaf_rollup(task_average(
        tasks.iter().filter(|t| t.lesson_id == Some(lesson_id)),
    ))
}

/// Progress of a stage: mean progress of its tasks, 0 when it has none
pub fn stage_progress(stage_id: Uuid, tasks: &[Task]) -> Rollup {
    leaf_rollup(task_average(
        tasks.iter().filter(|t| t.stage_id == stage_id),
    ))
}

/// Progress of a unit: weighted roll-up of its lessons
pub fn unit_progress(unit: &Unit, tasks: &[Task]) -> Rollup {
    rollup(
        unit.lessons
            .iter()
            .map(|l| (lesson_progress(l.guid, tasks).progress, l.weight)),
    )
}

/// Progress of a book: weighted roll-up of its units
pub fn book_progress(book: &Book, tasks: &[Task]) -> Rollup {
    rollup(
        book.units
            .iter()
            .map(|u| (unit_progress(u, tasks).progress, u.weight)),
    )
}

/// Progress of a grade: weighted roll-up of its books
pub fn grade_progress(grade: &Grade, tasks: &[Task]) -> Rollup {
    rollup(
        grade
            .books
            .iter()
            .map(|b| (book_progress(b, tasks).progress, b.weight)),
    )
}

/// Hierarchy pool: weighted roll-up of all grades under a project
pub fn hierarchy_rollup(grades: &[Grade], tasks: &[Task]) -> Rollup {
    rollup(
        grades
            .iter()
            .map(|g| (grade_progress(g, tasks).progress, g.weight)),
    )
}

/// Stage pool: weighted roll-up of all stages under a project
pub fn stages_rollup(stages: &[Stage], tasks: &[Task]) -> Rollup {
    rollup(
        stages
            .iter()
            .map(|s| (stage_progress(s.guid, tasks).progress, s.weight)),
    )
}

/// Which pool an overall project progress figure was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// Grade hierarchy pool (the project has grades)
    Hierarchy,
    /// Stage pool (no grades, but stages exist)
    Stages,
    /// Neither pool has members
    None,
}

/// Overall project progress with both pools reported side by side
///
/// The two pools cover the same tasks from different angles, so they are
/// never combined into a shared denominator. `progress` repeats the figure
/// from the pool named by `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub progress: i64,
    pub source: ProgressSource,
    pub hierarchy: Rollup,
    pub stages: Rollup,
}

/// Combine the grade pool and stage pool into overall project progress
///
/// The hierarchy pool wins whenever the project has grades; the stage pool
/// is the fallback for projects tracked by workflow stage alone.
pub fn project_progress(grades: &[Grade], stages: &[Stage], tasks: &[Task]) -> ProjectProgress {
    let hierarchy = if grades.is_empty() {
        Rollup::empty()
    } else {
        hierarchy_rollup(grades, tasks)
    };
    let stage_pool = if stages.is_empty() {
        Rollup::empty()
    } else {
        stages_rollup(stages, tasks)
    };

    let (progress, source) = if !grades.is_empty() {
        (hierarchy.progress, ProgressSource::Hierarchy)
    } else if !stages.is_empty() {
        (stage_pool.progress, ProgressSource::Stages)
    } else {
        (0, ProgressSource::None)
    };

    ProjectProgress {
        progress,
        source,
        hierarchy,
        stages: stage_pool,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Lesson;
    use crate::status::{TaskPriority, TaskStatus};

    fn task(lesson_id: Option<Uuid>, stage_id: Uuid, progress: i64) -> Task {
        Task {
            guid: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            stage_id,
            grade_id: None,
            book_id: None,
            unit_id: None,
            lesson_id,
            name: "task".to_string(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            progress,
            start_date: None,
            end_date: None,
            estimated_hours: 8.0,
            created_by: None,
        }
    }

    fn lesson(unit_id: Uuid, weight: f64) -> Lesson {
        Lesson {
            guid: Uuid::new_v4(),
            unit_id,
            name: "lesson".to_string(),
            weight,
            order_index: 0,
        }
    }

    #[test]
    fn test_lesson_progress_is_task_mean() {
        let lesson_id = Uuid::new_v4();
        let stage_id = Uuid::new_v4();
        let tasks = vec![
            task(Some(lesson_id), stage_id, 50),
            task(Some(lesson_id), stage_id, 75),
            task(Some(Uuid::new_v4()), stage_id, 0), // different lesson, excluded
        ];

        // mean(50, 75) = 62.5, rounds to 63
        assert_eq!(lesson_progress(lesson_id, &tasks).progress, 63);
    }

    #[test]
    fn test_lesson_with_no_tasks_is_zero() {
        assert_eq!(lesson_progress(Uuid::new_v4(), &[]).progress, 0);
    }

    #[test]
    fn test_stage_progress_is_task_mean() {
        let stage_id = Uuid::new_v4();
        let tasks = vec![
            task(None, stage_id, 100),
            task(None, stage_id, 0),
            task(None, Uuid::new_v4(), 100), // different stage, excluded
        ];

        assert_eq!(stage_progress(stage_id, &tasks).progress, 50);
    }

    #[test]
    fn test_unit_rollup_weights_children() {
        let unit_id = Uuid::new_v4();
        let stage_id = Uuid::new_v4();
        let l1 = lesson(unit_id, 75.0);
        let l2 = lesson(unit_id, 25.0);
        let tasks = vec![
            task(Some(l1.guid), stage_id, 100),
            task(Some(l2.guid), stage_id, 0),
        ];
        let unit = Unit {
            guid: unit_id,
            book_id: Uuid::new_v4(),
            name: "unit".to_string(),
            weight: 100.0,
            order_index: 0,
            lessons: vec![l1, l2],
        };

        let result = unit_progress(&unit, &tasks);
        assert_eq!(result.progress, 75);
        assert_eq!(result.total_weight, 100.0);
    }

    #[test]
    fn test_rollup_does_not_renormalize_bad_weights() {
        // Two lessons at 100% progress, but weights only sum to 60:
        // the unit reports 60, not 100, and total_weight exposes the gap.
        let unit_id = Uuid::new_v4();
        let stage_id = Uuid::new_v4();
        let l1 = lesson(unit_id, 30.0);
        let l2 = lesson(unit_id, 30.0);
        let tasks = vec![
            task(Some(l1.guid), stage_id, 100),
            task(Some(l2.guid), stage_id, 100),
        ];
        let unit = Unit {
            guid: unit_id,
            book_id: Uuid::new_v4(),
            name: "unit".to_string(),
            weight: 100.0,
            order_index: 0,
            lessons: vec![l1, l2],
        };

        let result = unit_progress(&unit, &tasks);
        assert_eq!(result.progress, 60);
        assert_eq!(result.total_weight, 60.0);
    }

    #[test]
    fn test_empty_children_roll_up_to_zero() {
        let unit = Unit {
            guid: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            name: "unit".to_string(),
            weight: 100.0,
            order_index: 0,
            lessons: Vec::new(),
        };
        let result = unit_progress(&unit, &[]);
        assert_eq!(result.progress, 0);
        assert_eq!(result.total_weight, 0.0);
    }

    /// Builds a grade with `books × units × lessons` structure, even weights,
    /// and one task per lesson at the given progress.
    fn uniform_grade(progress: i64, stage_id: Uuid) -> (Grade, Vec<Task>) {
        let grade_id = Uuid::new_v4();
        let mut books = Vec::new();
        let mut tasks = Vec::new();
        for _ in 0..2 {
            let book_id = Uuid::new_v4();
            let mut units = Vec::new();
            for _ in 0..2 {
                let unit_id = Uuid::new_v4();
                let lessons: Vec<Lesson> =
                    (0..2).map(|_| lesson(unit_id, 50.0)).collect();
                for l in &lessons {
                    tasks.push(task(Some(l.guid), stage_id, progress));
                }
                units.push(Unit {
                    guid: unit_id,
                    book_id,
                    name: "unit".to_string(),
                    weight: 50.0,
                    order_index: 0,
                    lessons,
                });
            }
            books.push(Book {
                guid: book_id,
                grade_id,
                name: "book".to_string(),
                weight: 50.0,
                order_index: 0,
                units,
            });
        }
        let grade = Grade {
            guid: grade_id,
            project_id: Uuid::new_v4(),
            name: "grade".to_string(),
            weight: 100.0,
            order_index: 0,
            books,
        };
        (grade, tasks)
    }

    #[test]
    fn test_all_complete_rolls_up_to_100() {
        let stage_id = Uuid::new_v4();
        let (grade, tasks) = uniform_grade(100, stage_id);
        assert_eq!(grade_progress(&grade, &tasks).progress, 100);
    }

    #[test]
    fn test_all_untouched_rolls_up_to_0() {
        let stage_id = Uuid::new_v4();
        let (grade, tasks) = uniform_grade(0, stage_id);
        assert_eq!(grade_progress(&grade, &tasks).progress, 0);
    }

    #[test]
    fn test_project_progress_prefers_hierarchy_pool() {
        let stage_id = Uuid::new_v4();
        let (grade, mut tasks) = uniform_grade(100, stage_id);
        let stage = Stage {
            guid: stage_id,
            project_id: grade.project_id,
            name: "stage".to_string(),
            weight: 100.0,
            order_index: 0,
        };
        // Add an unanchored stage task at 0 to pull the stage pool down
        tasks.push(task(None, stage_id, 0));

        let result = project_progress(&[grade], &[stage], &tasks);
        assert_eq!(result.source, ProgressSource::Hierarchy);
        assert_eq!(result.progress, 100);
        assert!(result.stages.progress < 100);
    }

    #[test]
    fn test_project_progress_falls_back_to_stage_pool() {
        let stage_id = Uuid::new_v4();
        let stage = Stage {
            guid: stage_id,
            project_id: Uuid::new_v4(),
            name: "stage".to_string(),
            weight: 100.0,
            order_index: 0,
        };
        let tasks = vec![task(None, stage_id, 50)];

        let result = project_progress(&[], &[stage], &tasks);
        assert_eq!(result.source, ProgressSource::Stages);
        assert_eq!(result.progress, 50);
        assert_eq!(result.hierarchy.progress, 0);
    }

    #[test]
    fn test_project_progress_with_no_pools() {
        let result = project_progress(&[], &[], &[]);
        assert_eq!(result.source, ProgressSource::None);
        assert_eq!(result.progress, 0);
    }
}
