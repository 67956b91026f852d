//! Category and stage template database operations

use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use lcpm_common::db::models::{Category, CategoryStage};
use lcpm_common::Result;

use super::parse_guid;

/// Save a category together with its ordered stage templates
pub async fn insert_category(pool: &SqlitePool, category: &Category) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO categories (guid, name, description) VALUES (?, ?, ?)")
        .bind(category.guid.to_string())
        .bind(&category.name)
        .bind(&category.description)
        .execute(&mut *tx)
        .await?;

    for stage in &category.stages {
        sqlx::query(
            r#"
            INSERT INTO category_stages (guid, category_id, name, order_index)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(stage.guid.to_string())
        .bind(stage.category_id.to_string())
        .bind(&stage.name)
        .bind(stage.order_index)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load a category with its stage templates in template order
pub async fn find_category(pool: &SqlitePool, category_id: Uuid) -> Result<Option<Category>> {
    let row = sqlx::query("SELECT guid, name, description FROM categories WHERE guid = ?")
        .bind(category_id.to_string())
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut category = Category {
        guid: parse_guid(&row.get::<String, _>("guid"), "categories.guid")?,
        name: row.get("name"),
        description: row.get("description"),
        stages: Vec::new(),
    };
    category.stages = load_stage_templates(pool, category.guid).await?;

    Ok(Some(category))
}

/// List all categories with their stage templates
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let rows = sqlx::query("SELECT guid, name, description FROM categories ORDER BY name")
        .fetch_all(pool)
        .await?;

    let mut categories = Vec::with_capacity(rows.len());
    for row in rows {
        categories.push(Category {
            guid: parse_guid(&row.get::<String, _>("guid"), "categories.guid")?,
            name: row.get("name"),
            description: row.get("description"),
            stages: Vec::new(),
        });
    }

    // Attach templates in one pass instead of one query per category
    let stage_rows = sqlx::query(
        r#"
        SELECT guid, category_id, name, order_index
        FROM category_stages
        ORDER BY category_id, order_index
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_category: HashMap<Uuid, Vec<CategoryStage>> = HashMap::new();
    for row in stage_rows {
        let stage = stage_template_from_row(&row)?;
        by_category.entry(stage.category_id).or_default().push(stage);
    }
    for category in &mut categories {
        if let Some(stages) = by_category.remove(&category.guid) {
            category.stages = stages;
        }
    }

    Ok(categories)
}

/// Load the ordered stage templates for one category
pub async fn load_stage_templates(
    pool: &SqlitePool,
    category_id: Uuid,
) -> Result<Vec<CategoryStage>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, category_id, name, order_index
        FROM category_stages
        WHERE category_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(category_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(stage_template_from_row).collect()
}

fn stage_template_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CategoryStage> {
    Ok(CategoryStage {
        guid: parse_guid(&row.get::<String, _>("guid"), "category_stages.guid")?,
        category_id: parse_guid(
            &row.get::<String, _>("category_id"),
            "category_stages.category_id",
        )?,
        name: row.get("name"),
        order_index: row.get("order_index"),
    })
}
