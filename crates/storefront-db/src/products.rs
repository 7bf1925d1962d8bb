//! Database operations for `products` and `product_categories`.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::import::{CanonicalProduct, CatalogStore, CategoryRef};
use storefront_core::{Pricing, ProductSort, ProductSortKey};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table with its category links folded in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub previous_price: Decimal,
    pub current_price: Decimal,
    pub discount: i16,
    pub image: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub rating: Decimal,
    pub brand: String,
    pub featured: bool,
    /// Linked category ids in link order.
    pub category_ids: Vec<i64>,
    /// Names matching `category_ids` position for position.
    pub category_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Stored prices as the floating-point [`Pricing`] the domain rules use.
    #[must_use]
    pub fn pricing(&self) -> Pricing {
        Pricing {
            price: self.price.to_f64().unwrap_or(0.0),
            previous_price: self.previous_price.to_f64().unwrap_or(0.0),
            current_price: self.current_price.to_f64().unwrap_or(0.0),
            discount: self.discount,
        }
    }
}

/// Filters for the public product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters<'a> {
    pub category_id: Option<i64>,
    pub featured: Option<bool>,
    /// Full-text query over name and description.
    pub search: Option<&'a str>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

/// One page of products plus the number of rows matching the filters.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductRow>,
    pub total: i64,
}

/// Sparse product update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pricing: Option<Pricing>,
    /// Replaces every category link when present.
    pub category_ids: Option<Vec<i64>>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
}

const PRODUCT_SELECT: &str = "SELECT \
         p.id, p.name, p.description, p.price, p.previous_price, p.current_price, \
         p.discount, p.image, p.images, p.stock, p.rating, p.brand, p.featured, \
         ARRAY(SELECT pc.category_id FROM product_categories pc \
               WHERE pc.product_id = p.id ORDER BY pc.position, pc.category_id) AS category_ids, \
         ARRAY(SELECT c.name FROM product_categories pc JOIN categories c ON c.id = pc.category_id \
               WHERE pc.product_id = p.id ORDER BY pc.position, pc.category_id) AS category_names, \
         p.created_at, p.updated_at \
     FROM products p";

const PRODUCT_FILTERS: &str = "WHERE ($1::BIGINT IS NULL OR EXISTS ( \
             SELECT 1 FROM product_categories f \
             WHERE f.product_id = p.id AND f.category_id = $1)) \
       AND ($2::BOOLEAN IS NULL OR p.featured = $2) \
       AND ($3::TEXT IS NULL OR to_tsvector('english', p.name || ' ' || p.description) \
             @@ plainto_tsquery('english', $3))";

fn order_by(sort: ProductSort) -> String {
    let column = match sort.key {
        ProductSortKey::CreatedAt => "p.created_at",
        ProductSortKey::Price => "p.price",
        ProductSortKey::Name => "p.name",
        ProductSortKey::Rating => "p.rating",
    };
    let direction = if sort.descending { "DESC" } else { "ASC" };
    format!("ORDER BY {column} {direction}, p.id {direction}")
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns one filtered, sorted page of products and the total match count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters<'_>,
) -> Result<ProductPage, DbError> {
    let search = filters.search.map(str::trim).filter(|s| !s.is_empty());

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM products p {PRODUCT_FILTERS}"
    ))
    .bind(filters.category_id)
    .bind(filters.featured)
    .bind(search)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} {PRODUCT_FILTERS} {} LIMIT $4 OFFSET $5",
        order_by(filters.sort)
    ))
    .bind(filters.category_id)
    .bind(filters.featured)
    .bind(search)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(ProductPage { items, total })
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

async fn link_categories(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO product_categories (product_id, category_id, position) \
         SELECT $1, ids.category_id, (ids.ord - 1)::SMALLINT \
         FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS ids(category_id, ord) \
         ON CONFLICT (product_id, category_id) DO NOTHING",
    )
    .bind(product_id)
    .bind(category_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        let e = DbError::from(e);
        if e.is_foreign_key_violation() {
            DbError::MissingReference("category")
        } else {
            e
        }
    })?;
    Ok(())
}

/// Inserts a product and its category links in one transaction and returns
/// the new id.
///
/// Prices are bound as `f64` and cast to `NUMERIC(10,2)`, so they are rounded
/// to cents on write.
///
/// # Errors
///
/// Returns [`DbError::MissingReference`] if a category id does not exist, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, product: &CanonicalProduct) -> Result<i64, DbError> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO products \
             (name, description, price, previous_price, current_price, discount, \
              image, images, stock, brand, featured) \
         VALUES ($1, $2, $3::numeric(10,2), $4::numeric(10,2), $5::numeric(10,2), $6, \
                 $7, $8, $9, COALESCE($10, ''), $11) \
         RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.pricing.price)
    .bind(product.pricing.previous_price)
    .bind(product.pricing.current_price)
    .bind(product.pricing.discount)
    .bind(&product.image)
    .bind(&product.images)
    .bind(product.stock)
    .bind(&product.brand)
    .bind(product.featured)
    .fetch_one(&mut *tx)
    .await?;

    link_categories(&mut tx, id, &product.category_ids).await?;
    tx.commit().await?;

    tracing::debug!(product_id = id, name = %product.name, "product created");
    Ok(id)
}

/// Applies a sparse update and returns the refreshed row, or `None` when no
/// product has `id`.
///
/// # Errors
///
/// Returns [`DbError::MissingReference`] if a new category id does not
/// exist, or [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    update: &ProductUpdate,
) -> Result<Option<ProductRow>, DbError> {
    let mut tx = pool.begin().await?;
    let pricing = update.pricing;
    let primary_image = update
        .images
        .as_ref()
        .and_then(|images| images.first().cloned());

    let updated = sqlx::query(
        "UPDATE products SET \
             name           = COALESCE($2, name), \
             description    = COALESCE($3, description), \
             price          = COALESCE($4::numeric(10,2), price), \
             previous_price = COALESCE($5::numeric(10,2), previous_price), \
             current_price  = COALESCE($6::numeric(10,2), current_price), \
             discount       = COALESCE($7, discount), \
             image          = COALESCE($8, image), \
             images         = COALESCE($9, images), \
             stock          = COALESCE($10, stock), \
             rating         = COALESCE($11::numeric(2,1), rating), \
             brand          = COALESCE($12, brand), \
             featured       = COALESCE($13, featured), \
             updated_at     = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(&update.name)
    .bind(&update.description)
    .bind(pricing.map(|p| p.price))
    .bind(pricing.map(|p| p.previous_price))
    .bind(pricing.map(|p| p.current_price))
    .bind(pricing.map(|p| p.discount))
    .bind(primary_image)
    .bind(&update.images)
    .bind(update.stock)
    .bind(update.rating)
    .bind(&update.brand)
    .bind(update.featured)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    if let Some(category_ids) = &update.category_ids {
        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        link_categories(&mut tx, id, category_ids).await?;
    }

    tx.commit().await?;
    get_product(pool, id).await
}

/// Deletes a product. Returns `false` when no product has `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// Importer store
// ---------------------------------------------------------------------------

/// Postgres-backed [`CatalogStore`] for the bulk importer.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgCatalog {
    type Error = DbError;

    async fn list_categories(&self) -> Result<Vec<CategoryRef>, DbError> {
        crate::categories::list_category_refs(&self.pool).await
    }

    async fn create_product(&self, product: &CanonicalProduct) -> Result<i64, DbError> {
        create_product(&self.pool, product).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_uses_whitelisted_columns_with_id_tiebreak() {
        assert_eq!(
            order_by(ProductSort::default()),
            "ORDER BY p.created_at DESC, p.id DESC"
        );
        let by_price: ProductSort = "price".parse().unwrap();
        assert_eq!(order_by(by_price), "ORDER BY p.price ASC, p.id ASC");
    }

    #[test]
    fn pricing_converts_stored_decimals() {
        let row = ProductRow {
            id: 1,
            name: "Tea".to_string(),
            description: String::new(),
            price: Decimal::new(8000, 2),
            previous_price: Decimal::new(10000, 2),
            current_price: Decimal::new(8000, 2),
            discount: 20,
            image: "a.jpg".to_string(),
            images: vec!["a.jpg".to_string()],
            stock: 3,
            rating: Decimal::ZERO,
            brand: String::new(),
            featured: false,
            category_ids: vec![1],
            category_names: vec!["Drinks".to_string()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let pricing = row.pricing();
        assert!((pricing.previous_price - 100.0).abs() < f64::EPSILON);
        assert!((pricing.current_price - 80.0).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 20);
    }
}
