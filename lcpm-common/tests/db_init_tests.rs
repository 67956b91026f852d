//! Tests for database initialization
//!
//! Covers automatic database creation, idempotent schema setup, the CHECK
//! constraints on tasks, and the NULL-coalescing deduplication index that
//! backs bulk task generation.

use sqlx::SqlitePool;
use std::path::PathBuf;
use uuid::Uuid;

use lcpm_common::db::init::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let test_db = format!("/tmp/lcpm-test-db-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    // Ensure database doesn't exist
    let _ = std::fs::remove_file(&db_path);

    let result = init_database(&db_path).await;

    assert!(
        result.is_ok(),
        "Database initialization failed: {:?}",
        result.err()
    );
    assert!(db_path.exists(), "Database file was not created");

    // Cleanup
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_database_opens_existing() {
    let test_db = format!("/tmp/lcpm-test-db-existing-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    // Create database first time
    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    // Open database second time (should succeed)
    let pool2 = init_database(&db_path).await;
    assert!(
        pool2.is_ok(),
        "Failed to open existing database: {:?}",
        pool2.err()
    );

    // Cleanup
    drop(pool1);
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_idempotent_initialization() {
    let test_db = format!("/tmp/lcpm-test-db-idempotent-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool1 = init_database(&db_path).await.unwrap();
    let count1: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&pool1)
            .await
            .unwrap();
    drop(pool1);

    let pool2 = init_database(&db_path).await.unwrap();
    let count2: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'")
            .fetch_one(&pool2)
            .await
            .unwrap();

    assert_eq!(count1, count2, "Table count changed on second initialization");

    // Cleanup
    drop(pool2);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_foreign_keys_enabled() {
    let test_db = format!("/tmp/lcpm-test-db-fk-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    let fk_enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(fk_enabled, 1, "Foreign keys should be enabled");

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_busy_timeout_set() {
    let test_db = format!("/tmp/lcpm-test-db-timeout-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();

    let timeout: i64 = sqlx::query_scalar("PRAGMA busy_timeout")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(timeout, 5000, "Busy timeout should be 5000ms");

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

/// Insert a project, one stage, and one grade; returns their guids.
async fn seed_project(pool: &SqlitePool) -> (String, String, String) {
    let project_id = Uuid::new_v4().to_string();
    let stage_id = Uuid::new_v4().to_string();
    let grade_id = Uuid::new_v4().to_string();

    sqlx::query("INSERT INTO projects (guid, name) VALUES (?, ?)")
        .bind(&project_id)
        .bind("Test Project")
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO stages (guid, project_id, name, weight, order_index) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&stage_id)
    .bind(&project_id)
    .bind("Writing")
    .bind(50.0)
    .bind(0)
    .execute(pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO grades (guid, project_id, name, weight, order_index) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&grade_id)
    .bind(&project_id)
    .bind("Grade 1")
    .bind(100.0)
    .bind(0)
    .execute(pool)
    .await
    .unwrap();

    (project_id, stage_id, grade_id)
}

async fn insert_task(
    pool: &SqlitePool,
    project_id: &str,
    stage_id: &str,
    grade_id: Option<&str>,
    status: &str,
) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO tasks (guid, project_id, stage_id, grade_id, name, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(project_id)
    .bind(stage_id)
    .bind(grade_id)
    .bind("Grade 1 - Writing")
    .bind(status)
    .execute(pool)
    .await
    .map(|_| ())
}

#[tokio::test]
async fn test_status_check_constraint_rejects_unknown() {
    let test_db = format!("/tmp/lcpm-test-db-status-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();
    let (project_id, stage_id, grade_id) = seed_project(&pool).await;

    let ok = insert_task(&pool, &project_id, &stage_id, Some(&grade_id), "in_progress").await;
    assert!(ok.is_ok(), "Valid status rejected: {:?}", ok.err());

    let bad = insert_task(&pool, &project_id, &stage_id, None, "done").await;
    assert!(bad.is_err(), "Unknown status 'done' should violate CHECK");

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_dedup_index_rejects_duplicate_coordinates() {
    let test_db = format!("/tmp/lcpm-test-db-dedup-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();
    let (project_id, stage_id, grade_id) = seed_project(&pool).await;

    // First task at (project, grade, NULL, NULL, NULL, stage) succeeds
    let first = insert_task(&pool, &project_id, &stage_id, Some(&grade_id), "not_started").await;
    assert!(first.is_ok(), "First insert failed: {:?}", first.err());

    // Second task at identical coordinates must hit the unique index,
    // even though book/unit/lesson are all NULL
    let second = insert_task(&pool, &project_id, &stage_id, Some(&grade_id), "not_started").await;
    let err = second.expect_err("Duplicate coordinates should violate the dedup index");
    let is_unique = err
        .as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false);
    assert!(is_unique, "Expected unique violation, got: {:?}", err);

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_dedup_index_allows_distinct_coordinates() {
    let test_db = format!("/tmp/lcpm-test-db-distinct-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();
    let (project_id, stage_id, grade_id) = seed_project(&pool).await;

    // Same project and stage, different hierarchy coordinates
    let grade_level = insert_task(&pool, &project_id, &stage_id, Some(&grade_id), "not_started").await;
    assert!(grade_level.is_ok());

    let project_level = insert_task(&pool, &project_id, &stage_id, None, "not_started").await;
    assert!(
        project_level.is_ok(),
        "All-NULL hierarchy should not collide with a grade-level task: {:?}",
        project_level.err()
    );

    // The index only covers anchored tasks, so a stage can hold any
    // number of manual unanchored tasks
    let another = insert_task(&pool, &project_id, &stage_id, None, "in_progress").await;
    assert!(
        another.is_ok(),
        "Unanchored tasks must not collide with each other: {:?}",
        another.err()
    );

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_cascade_delete_project_removes_children() {
    let test_db = format!("/tmp/lcpm-test-db-cascade-{}.db", std::process::id());
    let db_path = PathBuf::from(&test_db);

    let _ = std::fs::remove_file(&db_path);

    let pool = init_database(&db_path).await.unwrap();
    let (project_id, stage_id, grade_id) = seed_project(&pool).await;
    insert_task(&pool, &project_id, &stage_id, Some(&grade_id), "not_started")
        .await
        .unwrap();

    sqlx::query("DELETE FROM projects WHERE guid = ?")
        .bind(&project_id)
        .execute(&pool)
        .await
        .unwrap();

    let tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&pool)
        .await
        .unwrap();
    let stages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stages")
        .fetch_one(&pool)
        .await
        .unwrap();
    let grades: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(tasks, 0, "Tasks should cascade on project delete");
    assert_eq!(stages, 0, "Stages should cascade on project delete");
    assert_eq!(grades, 0, "Grades should cascade on project delete");

    // Cleanup
    drop(pool);
    let _ = std::fs::remove_file(&db_path);
}
