use sqlx::PgPool;
use storefront_core::category_slug;

use crate::DbError;

/// A category the store ships with.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

const fn category(
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    description: &'static str,
) -> DefaultCategory {
    DefaultCategory {
        name,
        icon,
        color,
        description,
    }
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    category("Fresh Produce", "apple", "green", "Fresh fruits and vegetables"),
    category("Grocery & Staples", "wheat", "amber", "Essential grocery items"),
    category("Spices & Masala", "flame", "red", "Spices and seasonings"),
    category("Dairy Products", "milk", "blue", "Milk, cheese, and dairy"),
    category("Meat & Frozen", "snowflake", "rose", "Frozen foods and meat"),
    category("Packaged Food", "package", "orange", "Packaged and canned foods"),
    category("Snacks & Bakery", "croissant", "yellow", "Snacks and baked goods"),
    category("Beverages", "coffee", "teal", "Drinks and beverages"),
    category("Household", "home", "slate", "Cleaning and household items"),
    category("Personal Care", "smile", "purple", "Personal care products"),
    category("Baby Care", "baby", "pink", "Baby products and care"),
    category("Pakistani Product", "flag", "green", "Pakistani specialty items"),
    category("Indian Product", "flag", "orange", "Indian specialty items"),
    category("African Product", "flag", "yellow", "African specialty items"),
    category("Filipino Product", "flag", "blue", "Filipino specialty items"),
];

/// Upserts categories by name, keeping ids of existing rows stable.
///
/// Returns the number of categories processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_categories(
    pool: &PgPool,
    categories: &[DefaultCategory],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for category in categories {
        sqlx::query(
            "INSERT INTO categories (name, slug, description, icon, color) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (name) DO UPDATE SET \
                 description = EXCLUDED.description, \
                 icon        = EXCLUDED.icon, \
                 color       = EXCLUDED.color, \
                 updated_at  = NOW()",
        )
        .bind(category.name)
        .bind(category_slug(category.name))
        .bind(category.description)
        .bind(category.icon)
        .bind(category.color)
        .execute(&mut *tx)
        .await?;
        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
