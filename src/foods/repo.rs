use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::foods::dto::{SortColumn, SortDir};
use crate::foods::model::{FoodRecord, FoodUpdate};

const COLUMNS: &str = "id, name, brand, category, location, price, certifications, \
    energy_kcal, protein_g, carbs_total_g, fat_total_g, saturated_fat_g, trans_fat_g, \
    sodium_mg, fiber_g, abv_percentage, density, serving_size_value, serving_size_unit, \
    nutrition_parsed, ingredients_list, ingredients_raw, nutrition_raw, \
    declared_special_nutrients, declared_processes, declared_warnings, nova, hfs, \
    hfs_version, front_photo_url, back_photo_url, nutrition_label_url, \
    ingredients_photo_url, created_at, last_update";

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FoodRecord>> {
    let row = sqlx::query_as::<_, FoodRecord>(&format!(
        "SELECT {COLUMNS} FROM foods WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("fetch food")?;
    Ok(row)
}

pub async fn list(
    db: &PgPool,
    order_by: SortColumn,
    dir: SortDir,
) -> anyhow::Result<Vec<FoodRecord>> {
    // Sort targets come from a fixed whitelist, never from raw user input.
    let rows = sqlx::query_as::<_, FoodRecord>(&format!(
        "SELECT {COLUMNS} FROM foods ORDER BY {} {}",
        order_by.as_sql(),
        dir.as_sql()
    ))
    .fetch_all(db)
    .await
    .context("list foods")?;
    Ok(rows)
}

/// Whole-field update: the save payload always carries every column, so a
/// save never leaves a partially-written row behind.
pub async fn update(db: &PgPool, id: Uuid, u: &FoodUpdate) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE foods SET
            name = $2, brand = $3, category = $4, location = $5, price = $6,
            certifications = $7, energy_kcal = $8, protein_g = $9,
            carbs_total_g = $10, fat_total_g = $11, saturated_fat_g = $12,
            trans_fat_g = $13, sodium_mg = $14, fiber_g = $15,
            abv_percentage = $16, density = $17, serving_size_value = $18,
            serving_size_unit = $19, nutrition_parsed = $20,
            ingredients_list = $21, ingredients_raw = $22, nutrition_raw = $23,
            declared_special_nutrients = $24, declared_processes = $25,
            declared_warnings = $26, nova = $27, hfs = $28, hfs_version = $29,
            front_photo_url = $30, back_photo_url = $31,
            nutrition_label_url = $32, ingredients_photo_url = $33,
            last_update = $34
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&u.name)
    .bind(&u.brand)
    .bind(&u.category)
    .bind(&u.location)
    .bind(u.price)
    .bind(&u.certifications)
    .bind(u.energy_kcal)
    .bind(u.protein_g)
    .bind(u.carbs_total_g)
    .bind(u.fat_total_g)
    .bind(u.saturated_fat_g)
    .bind(u.trans_fat_g)
    .bind(u.sodium_mg)
    .bind(u.fiber_g)
    .bind(u.abv_percentage)
    .bind(u.density)
    .bind(u.serving_size_value)
    .bind(&u.serving_size_unit)
    .bind(u.nutrition_parsed.as_ref().map(sqlx::types::Json))
    .bind(&u.ingredients_list)
    .bind(&u.ingredients_raw)
    .bind(&u.nutrition_raw)
    .bind(&u.declared_special_nutrients)
    .bind(&u.declared_processes)
    .bind(&u.declared_warnings)
    .bind(u.nova)
    .bind(u.hfs)
    .bind(u.hfs_version)
    .bind(&u.front_photo_url)
    .bind(&u.back_photo_url)
    .bind(&u.nutrition_label_url)
    .bind(&u.ingredients_photo_url)
    .bind(u.last_update)
    .execute(db)
    .await
    .context("update food")?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM foods WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete food")?;
    Ok(result.rows_affected() > 0)
}

/// Point one photo slot at a freshly uploaded object. The column name comes
/// from [`ImageSlot::column`](crate::foods::model::ImageSlot::column), not
/// from user input.
pub async fn set_image_url(
    db: &PgPool,
    id: Uuid,
    column: &'static str,
    url: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(&format!("UPDATE foods SET {column} = $2 WHERE id = $1"))
        .bind(id)
        .bind(url)
        .execute(db)
        .await
        .context("set image url")?;
    Ok(result.rows_affected() > 0)
}
