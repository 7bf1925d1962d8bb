use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/storefront-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &storefront_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    /// A referenced row (category, product) does not exist.
    #[error("unknown {0}")]
    MissingReference(&'static str),
    /// The row is still referenced and cannot be deleted.
    #[error("{0} is still in use")]
    InUse(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// `true` for a Postgres unique-constraint violation (SQLSTATE 23505).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        self.has_sqlstate("23505")
    }

    /// `true` for a Postgres foreign-key violation (SQLSTATE 23503).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        self.has_sqlstate("23503")
    }

    fn has_sqlstate(&self, code: &str) -> bool {
        matches!(
            self,
            Self::Sqlx(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(code)
        )
    }
}

/// Opens the shared Postgres pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies the embedded `migrations/` directory.
///
/// Yields how many migrations this call applied (0 when already current).
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    Ok(usize::try_from(after - before).unwrap_or(0))
}

/// Successful rows in `_sqlx_migrations`; 0 on a fresh database where the
/// table does not exist yet.
async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trips `SELECT 1` through the pool.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// [`ping`] with the error folded into [`DbError`] for the health route.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn non_database_errors_have_no_sqlstate() {
        assert!(!DbError::NotFound.is_unique_violation());
        assert!(!DbError::Sqlx(sqlx::Error::RowNotFound).is_foreign_key_violation());
    }
}

pub mod carts;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod seed;
pub mod users;

pub use carts::{
    add_cart_item, clear_cart, list_cart_items, remove_cart_item, set_cart_item_quantity,
    CartItemRow,
};
pub use categories::{
    create_category, delete_category, get_category, list_categories, list_category_refs,
    update_category, CategoryRow, CategoryUpdate, NewCategory,
};
pub use coupons::{create_coupon, delete_coupon, find_active_coupon, list_coupons, CouponRow};
pub use dashboard::{
    dashboard_summary, daily_sales, low_stock_products, recent_orders, top_products,
    DailySalesRow, DashboardSummaryRow, LowStockRow, TopProductRow,
};
pub use orders::{
    create_order, get_order, get_order_with_customer, list_all_orders, list_order_items,
    list_orders_for_user, update_order_status, NewOrder, OrderItemRow, OrderRow,
    OrderWithCustomerRow,
};
pub use products::{
    create_product, delete_product, get_product, list_products, update_product, PgCatalog,
    ProductFilters, ProductPage, ProductRow, ProductUpdate,
};
pub use seed::{seed_categories, DefaultCategory, DEFAULT_CATEGORIES};
pub use users::{
    create_user, get_user, get_user_by_email, list_users, set_user_role, update_profile,
    NewUser, ProfileUpdate, UserRow,
};
