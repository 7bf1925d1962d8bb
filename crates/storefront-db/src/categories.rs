//! Database operations for `categories`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storefront_core::import::CategoryRef;

use crate::DbError;

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Icon name understood by the storefront UI, e.g. `"apple"`.
    pub icon: String,
    pub color: String,
    /// Higher sorts first.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub color: Option<&'a str>,
    pub priority: Option<i32>,
}

/// Sparse update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub description: Option<&'a str>,
    pub icon: Option<&'a str>,
    pub color: Option<&'a str>,
    pub priority: Option<i32>,
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, description, icon, color, priority, created_at, updated_at";

/// Returns all categories, highest priority first, then by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY priority DESC, name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns `(id, name)` for every category in insertion order. The importer
/// uses the first entry as its fallback category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_category_refs(pool: &PgPool) -> Result<Vec<CategoryRef>, DbError> {
    let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM categories ORDER BY id")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name)| CategoryRef { id, name })
        .collect())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a category and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including unique
/// violations on `name` or `slug`.
pub async fn create_category(
    pool: &PgPool,
    category: &NewCategory<'_>,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "INSERT INTO categories (name, slug, description, icon, color, priority) \
         VALUES ($1, $2, COALESCE($3, ''), COALESCE($4, 'box'), COALESCE($5, 'blue'), \
                 COALESCE($6, 0)) \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(category.name)
    .bind(category.slug)
    .bind(category.description)
    .bind(category.icon)
    .bind(category.color)
    .bind(category.priority)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a sparse update. Returns `None` when no category has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails, including unique
/// violations on `name` or `slug`.
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    update: &CategoryUpdate<'_>,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "UPDATE categories SET \
             name        = COALESCE($2, name), \
             slug        = COALESCE($3, slug), \
             description = COALESCE($4, description), \
             icon        = COALESCE($5, icon), \
             color       = COALESCE($6, color), \
             priority    = COALESCE($7, priority), \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(id)
    .bind(update.name)
    .bind(update.slug)
    .bind(update.description)
    .bind(update.icon)
    .bind(update.color)
    .bind(update.priority)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Deletes a category. Returns `false` when no category has `id`.
///
/// # Errors
///
/// Returns [`DbError::InUse`] while products still reference the category,
/// or [`DbError::Sqlx`] for other failures.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(DbError::from);

    match result {
        Ok(done) => Ok(done.rows_affected() > 0),
        Err(e) if e.is_foreign_key_violation() => Err(DbError::InUse("category")),
        Err(e) => Err(e),
    }
}
