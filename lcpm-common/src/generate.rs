//! Bulk task generation planning
//!
//! Pure planning half of task generation: walking the hierarchy for its
//! lowest units, building dedup keys, and deciding create-vs-skip for each
//! (lowest unit × stage) pair. The write phase lives with the service's
//! persistence layer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Grade, Stage};

/// Default estimated effort for a generated task, in hours
pub const DEFAULT_ESTIMATED_HOURS: f64 = 8.0;

/// Deadline horizon for generated tasks when the project has no end date,
/// in days from today
pub const DEFAULT_DEADLINE_DAYS: i64 = 30;

/// Skip reason recorded for pairs that already have a task
pub const SKIP_REASON_EXISTS: &str = "Task already exists";

/// A hierarchy node with no children, the anchor point for generated tasks
///
/// Identifier fields hold the node's full ancestor chain; levels below the
/// node itself stay None. A grade with no books anchors at the grade alone,
/// a lesson carries all four identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowestUnit {
    pub grade_id: Uuid,
    pub book_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    /// Ancestor names joined with " > ", e.g. "Grade 1 > Book A > Unit 3"
    pub component_path: String,
}

impl LowestUnit {
    /// Dedup key for this unit paired with a stage
    pub fn key_for_stage(&self, stage_id: Uuid) -> TaskKey {
        TaskKey {
            grade_id: Some(self.grade_id),
            book_id: self.book_id,
            unit_id: self.unit_id,
            lesson_id: self.lesson_id,
            stage_id,
        }
    }
}

/// Dedup identity of a task within a project
///
/// Two tasks are duplicates when they anchor to the same hierarchy
/// positions (None matching None) and the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub grade_id: Option<Uuid>,
    pub book_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub lesson_id: Option<Uuid>,
    pub stage_id: Uuid,
}

/// Walk the grade tree and collect every childless node exactly once
///
/// Every lesson qualifies; a unit qualifies only with zero lessons, a book
/// only with zero units, a grade only with zero books. Order follows the
/// tree's own child ordering, depth-first.
pub fn lowest_units(grades: &[Grade]) -> Vec<LowestUnit> {
    let mut units = Vec::new();

    for grade in grades {
        if grade.books.is_empty() {
            units.push(LowestUnit {
                grade_id: grade.guid,
                book_id: None,
                unit_id: None,
                lesson_id: None,
                component_path: grade.name.clone(),
            });
            continue;
        }
        for book in &grade.books {
            if book.units.is_empty() {
                units.push(LowestUnit {
                    grade_id: grade.guid,
                    book_id: Some(book.guid),
                    unit_id: None,
                    lesson_id: None,
                    component_path: format!("{} > {}", grade.name, book.name),
                });
                continue;
            }
            for unit in &book.units {
                if unit.lessons.is_empty() {
                    units.push(LowestUnit {
                        grade_id: grade.guid,
                        book_id: Some(book.guid),
                        unit_id: Some(unit.guid),
                        lesson_id: None,
                        component_path: format!(
                            "{} > {} > {}",
                            grade.name, book.name, unit.name
                        ),
                    });
                    continue;
                }
                for lesson in &unit.lessons {
                    units.push(LowestUnit {
                        grade_id: grade.guid,
                        book_id: Some(book.guid),
                        unit_id: Some(unit.guid),
                        lesson_id: Some(lesson.guid),
                        component_path: format!(
                            "{} > {} > {} > {}",
                            grade.name, book.name, unit.name, lesson.name
                        ),
                    });
                }
            }
        }
    }

    units
}

/// One task the plan intends to create
#[derive(Debug, Clone)]
pub struct PlannedTask {
    pub key: TaskKey,
    pub stage_id: Uuid,
    pub stage_name: String,
    pub component_path: String,
    /// "{component_path} - {stage name}"
    pub name: String,
    /// "Task for {component_path} at {stage name} stage"
    pub description: String,
}

/// Create/skip decisions for every (lowest unit × stage) pair
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    pub total_stages: usize,
    pub total_units: usize,
    pub to_create: Vec<PlannedTask>,
    pub skipped: Vec<SkippedTask>,
}

impl GenerationPlan {
    /// Number of pairs, created or skipped
    pub fn expected_tasks(&self) -> usize {
        self.total_stages * self.total_units
    }
}

/// Summary line item for a created task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTask {
    pub name: String,
    pub component_path: String,
    pub stage: String,
}

/// Summary line item for a skipped pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTask {
    pub name: String,
    pub component_path: String,
    pub stage: String,
    pub reason: String,
}

/// Structured result of a bulk generation run
///
/// Returned even when every pair was skipped; partial success is reported
/// item by item, never as an overall failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total_stages: usize,
    pub total_units: usize,
    pub expected_tasks: usize,
    pub created_count: usize,
    pub skipped_count: usize,
    pub created: Vec<CreatedTask>,
    pub skipped: Vec<SkippedTask>,
}

/// Decide create-vs-skip for every (lowest unit × stage) pair
///
/// Outer iteration follows the lowest-unit order from `lowest_units`,
/// inner iteration the stage template order. Pairs whose key appears in
/// `existing` are skipped with [`SKIP_REASON_EXISTS`].
pub fn plan_generation(
    units: &[LowestUnit],
    stages: &[Stage],
    existing: &HashSet<TaskKey>,
) -> GenerationPlan {
    let mut to_create = Vec::new();
    let mut skipped = Vec::new();

    for unit in units {
        for stage in stages {
            let key = unit.key_for_stage(stage.guid);
            let name = format!("{} - {}", unit.component_path, stage.name);
            if existing.contains(&key) {
                skipped.push(SkippedTask {
                    name,
                    component_path: unit.component_path.clone(),
                    stage: stage.name.clone(),
                    reason: SKIP_REASON_EXISTS.to_string(),
                });
            } else {
                to_create.push(PlannedTask {
                    key,
                    stage_id: stage.guid,
                    stage_name: stage.name.clone(),
                    component_path: unit.component_path.clone(),
                    description: format!(
                        "Task for {} at {} stage",
                        unit.component_path, stage.name
                    ),
                    name,
                });
            }
        }
    }

    GenerationPlan {
        total_stages: stages.len(),
        total_units: units.len(),
        to_create,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Book, Lesson, Unit};

    fn stage(name: &str, order_index: i64) -> Stage {
        Stage {
            guid: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: name.to_string(),
            weight: 0.0,
            order_index,
        }
    }

    /// G1 > B1 > U1 (no lessons) plus G1 > B2 (no units): the two lowest
    /// units are U1 and B2.
    fn sample_grade() -> Grade {
        let grade_id = Uuid::new_v4();
        let b1_id = Uuid::new_v4();
        Grade {
            guid: grade_id,
            project_id: Uuid::new_v4(),
            name: "G1".to_string(),
            weight: 100.0,
            order_index: 0,
            books: vec![
                Book {
                    guid: b1_id,
                    grade_id,
                    name: "B1".to_string(),
                    weight: 50.0,
                    order_index: 0,
                    units: vec![Unit {
                        guid: Uuid::new_v4(),
                        book_id: b1_id,
                        name: "U1".to_string(),
                        weight: 100.0,
                        order_index: 0,
                        lessons: Vec::new(),
                    }],
                },
                Book {
                    guid: Uuid::new_v4(),
                    grade_id,
                    name: "B2".to_string(),
                    weight: 50.0,
                    order_index: 1,
                    units: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_lowest_units_childless_nodes_only() {
        let grade = sample_grade();
        let units = lowest_units(&[grade]);

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].component_path, "G1 > B1 > U1");
        assert!(units[0].unit_id.is_some());
        assert!(units[0].lesson_id.is_none());
        assert_eq!(units[1].component_path, "G1 > B2");
        assert!(units[1].book_id.is_some());
        assert!(units[1].unit_id.is_none());
    }

    #[test]
    fn test_lowest_units_lessons_always_qualify() {
        let grade_id = Uuid::new_v4();
        let book_id = Uuid::new_v4();
        let unit_id = Uuid::new_v4();
        let grade = Grade {
            guid: grade_id,
            project_id: Uuid::new_v4(),
            name: "Grade 1".to_string(),
            weight: 100.0,
            order_index: 0,
            books: vec![Book {
                guid: book_id,
                grade_id,
                name: "Book A".to_string(),
                weight: 100.0,
                order_index: 0,
                units: vec![Unit {
                    guid: unit_id,
                    book_id,
                    name: "Unit 3".to_string(),
                    weight: 100.0,
                    order_index: 0,
                    lessons: vec![
                        Lesson {
                            guid: Uuid::new_v4(),
                            unit_id,
                            name: "Lesson 1".to_string(),
                            weight: 50.0,
                            order_index: 0,
                        },
                        Lesson {
                            guid: Uuid::new_v4(),
                            unit_id,
                            name: "Lesson 2".to_string(),
                            weight: 50.0,
                            order_index: 1,
                        },
                    ],
                }],
            }],
        };

        let units = lowest_units(&[grade]);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].component_path, "Grade 1 > Book A > Unit 3 > Lesson 1");
        assert!(units[0].lesson_id.is_some());
        // The unit has lessons, so it must not appear itself
        assert!(units.iter().all(|u| u.lesson_id.is_some()));
    }

    #[test]
    fn test_lowest_units_bare_grade() {
        let grade = Grade {
            guid: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "G9".to_string(),
            weight: 100.0,
            order_index: 0,
            books: Vec::new(),
        };
        let units = lowest_units(&[grade.clone()]);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].grade_id, grade.guid);
        assert_eq!(units[0].component_path, "G9");
        assert!(units[0].book_id.is_none());
    }

    #[test]
    fn test_lowest_units_empty_tree() {
        assert!(lowest_units(&[]).is_empty());
    }

    #[test]
    fn test_plan_creates_full_cross_product() {
        let grade = sample_grade();
        let units = lowest_units(&[grade]);
        let stages = vec![stage("Draft", 0), stage("Review", 1), stage("Publish", 2)];

        let plan = plan_generation(&units, &stages, &HashSet::new());

        assert_eq!(plan.total_units, 2);
        assert_eq!(plan.total_stages, 3);
        assert_eq!(plan.expected_tasks(), 6);
        assert_eq!(plan.to_create.len(), 6);
        assert!(plan.skipped.is_empty());

        // Outer iteration by unit, inner by stage
        assert_eq!(plan.to_create[0].name, "G1 > B1 > U1 - Draft");
        assert_eq!(plan.to_create[2].name, "G1 > B1 > U1 - Publish");
        assert_eq!(plan.to_create[3].name, "G1 > B2 - Draft");
        assert_eq!(
            plan.to_create[0].description,
            "Task for G1 > B1 > U1 at Draft stage"
        );
    }

    #[test]
    fn test_plan_skips_existing_keys() {
        let grade = sample_grade();
        let units = lowest_units(&[grade]);
        let stages = vec![stage("Draft", 0), stage("Review", 1)];

        // Pre-existing task for the first unit's Draft stage
        let mut existing = HashSet::new();
        existing.insert(units[0].key_for_stage(stages[0].guid));

        let plan = plan_generation(&units, &stages, &existing);

        assert_eq!(plan.to_create.len(), 3);
        assert_eq!(plan.skipped.len(), 1);
        assert_eq!(plan.skipped[0].reason, SKIP_REASON_EXISTS);
        assert_eq!(plan.skipped[0].name, "G1 > B1 > U1 - Draft");
    }

    #[test]
    fn test_plan_second_run_skips_everything() {
        let grade = sample_grade();
        let units = lowest_units(&[grade]);
        let stages = vec![stage("Draft", 0), stage("Review", 1), stage("Publish", 2)];

        let first = plan_generation(&units, &stages, &HashSet::new());
        let existing: HashSet<TaskKey> = first.to_create.iter().map(|t| t.key).collect();

        let second = plan_generation(&units, &stages, &existing);
        assert!(second.to_create.is_empty());
        assert_eq!(second.skipped.len(), 6);
        assert!(second.skipped.iter().all(|s| s.reason == SKIP_REASON_EXISTS));
    }

    #[test]
    fn test_key_distinguishes_null_levels() {
        // A task anchored at a unit and one anchored at a lesson under that
        // unit must not collide.
        let stage_id = Uuid::new_v4();
        let at_unit = LowestUnit {
            grade_id: Uuid::new_v4(),
            book_id: Some(Uuid::new_v4()),
            unit_id: Some(Uuid::new_v4()),
            lesson_id: None,
            component_path: "G > B > U".to_string(),
        };
        let mut at_lesson = at_unit.clone();
        at_lesson.lesson_id = Some(Uuid::new_v4());

        assert_ne!(
            at_unit.key_for_stage(stage_id),
            at_lesson.key_for_stage(stage_id)
        );
        // Same anchor, different stage differs too
        assert_ne!(
            at_unit.key_for_stage(stage_id),
            at_unit.key_for_stage(Uuid::new_v4())
        );
    }
}
