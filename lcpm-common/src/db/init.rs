//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. Every create function uses CREATE TABLE IF NOT EXISTS,
//! so calling init_database on an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc creates the database file when missing
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    // Wait for locks instead of failing immediately under contention
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    // Run schema creation (idempotent - safe to call multiple times)
    create_categories_table(&pool).await?;
    create_category_stages_table(&pool).await?;
    create_projects_table(&pool).await?;
    create_stages_table(&pool).await?;

    // Content hierarchy tables
    create_grades_table(&pool).await?;
    create_books_table(&pool).await?;
    create_units_table(&pool).await?;
    create_lessons_table(&pool).await?;

    create_tasks_table(&pool).await?;

    info!("Database schema ready");
    Ok(pool)
}

async fn create_categories_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the category_stages table
///
/// Stage templates attached to a category. Their order_index defines the
/// stage order copied into every project created under the category.
async fn create_category_stages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS category_stages (
            guid TEXT PRIMARY KEY,
            category_id TEXT NOT NULL REFERENCES categories(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_category_stages_category_id ON category_stages(category_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_projects_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            category_id TEXT REFERENCES categories(guid) ON DELETE SET NULL,
            start_date DATE,
            end_date DATE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_category_id ON projects(category_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the stages table
///
/// Per-project production stages, copied from the category's templates at
/// project creation time. Weights are percentages of project effort.
async fn create_stages_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stages (
            guid TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0 CHECK (weight >= 0 AND weight <= 100),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stages_project_id ON stages(project_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_grades_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS grades (
            guid TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0 CHECK (weight >= 0 AND weight <= 100),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_grades_project_id ON grades(project_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_books_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            guid TEXT PRIMARY KEY,
            grade_id TEXT NOT NULL REFERENCES grades(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0 CHECK (weight >= 0 AND weight <= 100),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_grade_id ON books(grade_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_units_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS units (
            guid TEXT PRIMARY KEY,
            book_id TEXT NOT NULL REFERENCES books(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0 CHECK (weight >= 0 AND weight <= 100),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_units_book_id ON units(book_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_lessons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            guid TEXT PRIMARY KEY,
            unit_id TEXT NOT NULL REFERENCES units(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            weight REAL NOT NULL DEFAULT 0 CHECK (weight >= 0 AND weight <= 100),
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lessons_unit_id ON lessons(unit_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the tasks table and its deduplication index
///
/// The unique index coalesces NULL hierarchy columns to '' so that two
/// tasks at the same coordinates collide even when some levels are NULL.
/// SQLite treats NULLs as distinct in plain unique constraints, which
/// would let duplicate grade-level tasks slip through. The index only
/// covers hierarchy-anchored tasks (grade_id set, true of every generated
/// task); a stage may hold any number of unanchored manual tasks.
async fn create_tasks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            guid TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(guid) ON DELETE CASCADE,
            stage_id TEXT NOT NULL REFERENCES stages(guid) ON DELETE CASCADE,
            grade_id TEXT REFERENCES grades(guid) ON DELETE CASCADE,
            book_id TEXT REFERENCES books(guid) ON DELETE CASCADE,
            unit_id TEXT REFERENCES units(guid) ON DELETE CASCADE,
            lesson_id TEXT REFERENCES lessons(guid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'not_started'
                CHECK (status IN ('not_started', 'in_progress', 'under_review', 'completed', 'blocked')),
            priority TEXT NOT NULL DEFAULT 'medium'
                CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
            progress INTEGER NOT NULL DEFAULT 0 CHECK (progress >= 0 AND progress <= 100),
            start_date DATE,
            end_date DATE,
            estimated_hours REAL NOT NULL DEFAULT 0 CHECK (estimated_hours >= 0),
            created_by TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_project_id ON tasks(project_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_stage_id ON tasks(stage_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_dedup ON tasks(
            project_id,
            COALESCE(grade_id, ''),
            COALESCE(book_id, ''),
            COALESCE(unit_id, ''),
            COALESCE(lesson_id, ''),
            stage_id
        )
        WHERE grade_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
