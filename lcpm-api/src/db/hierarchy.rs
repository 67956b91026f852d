//! Content hierarchy database operations
//!
//! The four content levels (grades, books, units, lessons) share one set
//! of queries. Table and column names come from the HierarchyLevel enum,
//! never from request input, so the format! query building is safe.

use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use lcpm_common::db::models::{Book, Grade, Lesson, Unit};
use lcpm_common::Result;

use super::parse_guid;

/// Content hierarchy levels addressable through the generic node API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Grades,
    Books,
    Units,
    Lessons,
}

impl HierarchyLevel {
    /// Parse a URL path segment ("grades", "books", "units", "lessons")
    pub fn from_path_segment(s: &str) -> Option<Self> {
        match s {
            "grades" => Some(HierarchyLevel::Grades),
            "books" => Some(HierarchyLevel::Books),
            "units" => Some(HierarchyLevel::Units),
            "lessons" => Some(HierarchyLevel::Lessons),
            _ => None,
        }
    }

    /// Table holding nodes of this level
    pub fn table(&self) -> &'static str {
        match self {
            HierarchyLevel::Grades => "grades",
            HierarchyLevel::Books => "books",
            HierarchyLevel::Units => "units",
            HierarchyLevel::Lessons => "lessons",
        }
    }

    /// Column pointing at the parent scope
    pub fn parent_column(&self) -> &'static str {
        match self {
            HierarchyLevel::Grades => "project_id",
            HierarchyLevel::Books => "grade_id",
            HierarchyLevel::Units => "book_id",
            HierarchyLevel::Lessons => "unit_id",
        }
    }

    /// The level below, if any
    pub fn child(&self) -> Option<HierarchyLevel> {
        match self {
            HierarchyLevel::Grades => Some(HierarchyLevel::Books),
            HierarchyLevel::Books => Some(HierarchyLevel::Units),
            HierarchyLevel::Units => Some(HierarchyLevel::Lessons),
            HierarchyLevel::Lessons => None,
        }
    }
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// One row of any hierarchy table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub guid: Uuid,
    pub parent_id: Uuid,
    pub name: String,
    pub weight: f64,
    pub order_index: i64,
}

pub async fn insert_node(
    pool: &SqlitePool,
    level: HierarchyLevel,
    node: &HierarchyNode,
) -> Result<()> {
    let sql = format!(
        "INSERT INTO {} (guid, {}, name, weight, order_index) VALUES (?, ?, ?, ?, ?)",
        level.table(),
        level.parent_column(),
    );
    sqlx::query(&sql)
        .bind(node.guid.to_string())
        .bind(node.parent_id.to_string())
        .bind(&node.name)
        .bind(node.weight)
        .bind(node.order_index)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn node_exists(pool: &SqlitePool, level: HierarchyLevel, id: Uuid) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE guid = ?", level.table());
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// True if any node one level down points at this node
///
/// Lessons have no child level and always report false; their tasks
/// cascade on delete and do not block it.
pub async fn has_children(pool: &SqlitePool, level: HierarchyLevel, id: Uuid) -> Result<bool> {
    let Some(child) = level.child() else {
        return Ok(false);
    };

    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        child.table(),
        child.parent_column(),
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

pub async fn delete_node(pool: &SqlitePool, level: HierarchyLevel, id: Uuid) -> Result<u64> {
    let sql = format!("DELETE FROM {} WHERE guid = ?", level.table());
    let result = sqlx::query(&sql).bind(id.to_string()).execute(pool).await?;

    Ok(result.rows_affected())
}

/// Siblings under one parent scope, in order_index order
pub async fn list_siblings(
    pool: &SqlitePool,
    level: HierarchyLevel,
    parent_id: Uuid,
) -> Result<Vec<HierarchyNode>> {
    let sql = format!(
        "SELECT guid, {} AS parent_id, name, weight, order_index FROM {} WHERE {} = ? ORDER BY order_index",
        level.parent_column(),
        level.table(),
        level.parent_column(),
    );
    let rows = sqlx::query(&sql)
        .bind(parent_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(HierarchyNode {
                guid: parse_guid(&row.get::<String, _>("guid"), "guid")?,
                parent_id: parse_guid(&row.get::<String, _>("parent_id"), "parent_id")?,
                name: row.get("name"),
                weight: row.get("weight"),
                order_index: row.get("order_index"),
            })
        })
        .collect()
}

/// Next free order_index under a parent scope
pub async fn next_order_index(
    pool: &SqlitePool,
    level: HierarchyLevel,
    parent_id: Uuid,
) -> Result<i64> {
    let sql = format!(
        "SELECT COALESCE(MAX(order_index) + 1, 0) FROM {} WHERE {} = ?",
        level.table(),
        level.parent_column(),
    );
    let next: i64 = sqlx::query_scalar(&sql)
        .bind(parent_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(next)
}

/// Persist new weights for a sibling set in one transaction
pub async fn update_weights(
    pool: &SqlitePool,
    level: HierarchyLevel,
    weights: &[(Uuid, f64)],
) -> Result<()> {
    let sql = format!("UPDATE {} SET weight = ? WHERE guid = ?", level.table());

    let mut tx = pool.begin().await?;
    for (guid, weight) in weights {
        sqlx::query(&sql)
            .bind(weight)
            .bind(guid.to_string())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(())
}

/// Resolve the project owning a parent scope id
///
/// For grades the parent scope is the project itself; deeper levels walk
/// up the chain. Returns None when the scope id does not exist, which
/// doubles as the parent-existence check for node creation.
pub async fn project_id_for_parent(
    pool: &SqlitePool,
    level: HierarchyLevel,
    parent_id: Uuid,
) -> Result<Option<Uuid>> {
    let sql = match level {
        HierarchyLevel::Grades => "SELECT guid FROM projects WHERE guid = ?",
        HierarchyLevel::Books => "SELECT project_id FROM grades WHERE guid = ?",
        HierarchyLevel::Units => {
            r#"
            SELECT g.project_id FROM books b
            JOIN grades g ON b.grade_id = g.guid
            WHERE b.guid = ?
            "#
        }
        HierarchyLevel::Lessons => {
            r#"
            SELECT g.project_id FROM units u
            JOIN books b ON u.book_id = b.guid
            JOIN grades g ON b.grade_id = g.guid
            WHERE u.guid = ?
            "#
        }
    };

    let guid: Option<String> = sqlx::query_scalar(sql)
        .bind(parent_id.to_string())
        .fetch_optional(pool)
        .await?;

    guid.map(|g| parse_guid(&g, "project_id")).transpose()
}

/// Load a project's full Grade → Book → Unit → Lesson tree
///
/// Four queries, one per level, assembled bottom-up. Every level is
/// ordered by order_index so the tree iterates in display order.
pub async fn load_tree(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Grade>> {
    let project_guid = project_id.to_string();

    let lesson_rows = sqlx::query(
        r#"
        SELECT l.guid, l.unit_id, l.name, l.weight, l.order_index
        FROM lessons l
        JOIN units u ON l.unit_id = u.guid
        JOIN books b ON u.book_id = b.guid
        JOIN grades g ON b.grade_id = g.guid
        WHERE g.project_id = ?
        ORDER BY l.order_index
        "#,
    )
    .bind(&project_guid)
    .fetch_all(pool)
    .await?;

    let mut lessons_by_unit: HashMap<Uuid, Vec<Lesson>> = HashMap::new();
    for row in lesson_rows {
        let lesson = Lesson {
            guid: parse_guid(&row.get::<String, _>("guid"), "lessons.guid")?,
            unit_id: parse_guid(&row.get::<String, _>("unit_id"), "lessons.unit_id")?,
            name: row.get("name"),
            weight: row.get("weight"),
            order_index: row.get("order_index"),
        };
        lessons_by_unit.entry(lesson.unit_id).or_default().push(lesson);
    }

    let unit_rows = sqlx::query(
        r#"
        SELECT u.guid, u.book_id, u.name, u.weight, u.order_index
        FROM units u
        JOIN books b ON u.book_id = b.guid
        JOIN grades g ON b.grade_id = g.guid
        WHERE g.project_id = ?
        ORDER BY u.order_index
        "#,
    )
    .bind(&project_guid)
    .fetch_all(pool)
    .await?;

    let mut units_by_book: HashMap<Uuid, Vec<Unit>> = HashMap::new();
    for row in unit_rows {
        let guid = parse_guid(&row.get::<String, _>("guid"), "units.guid")?;
        let unit = Unit {
            guid,
            book_id: parse_guid(&row.get::<String, _>("book_id"), "units.book_id")?,
            name: row.get("name"),
            weight: row.get("weight"),
            order_index: row.get("order_index"),
            lessons: lessons_by_unit.remove(&guid).unwrap_or_default(),
        };
        units_by_book.entry(unit.book_id).or_default().push(unit);
    }

    let book_rows = sqlx::query(
        r#"
        SELECT b.guid, b.grade_id, b.name, b.weight, b.order_index
        FROM books b
        JOIN grades g ON b.grade_id = g.guid
        WHERE g.project_id = ?
        ORDER BY b.order_index
        "#,
    )
    .bind(&project_guid)
    .fetch_all(pool)
    .await?;

    let mut books_by_grade: HashMap<Uuid, Vec<Book>> = HashMap::new();
    for row in book_rows {
        let guid = parse_guid(&row.get::<String, _>("guid"), "books.guid")?;
        let book = Book {
            guid,
            grade_id: parse_guid(&row.get::<String, _>("grade_id"), "books.grade_id")?,
            name: row.get("name"),
            weight: row.get("weight"),
            order_index: row.get("order_index"),
            units: units_by_book.remove(&guid).unwrap_or_default(),
        };
        books_by_grade.entry(book.grade_id).or_default().push(book);
    }

    let grade_rows = sqlx::query(
        r#"
        SELECT guid, project_id, name, weight, order_index
        FROM grades
        WHERE project_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(&project_guid)
    .fetch_all(pool)
    .await?;

    let mut grades = Vec::with_capacity(grade_rows.len());
    for row in grade_rows {
        let guid = parse_guid(&row.get::<String, _>("guid"), "grades.guid")?;
        grades.push(Grade {
            guid,
            project_id: parse_guid(&row.get::<String, _>("project_id"), "grades.project_id")?,
            name: row.get("name"),
            weight: row.get("weight"),
            order_index: row.get("order_index"),
            books: books_by_grade.remove(&guid).unwrap_or_default(),
        });
    }

    Ok(grades)
}
