//! Admin dashboard, user management and sales analytics.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::Role;

use crate::middleware::{AuthUser, RequestId};

use super::accounts::UserItem;
use super::{map_db_error, money, validation_error, ApiError, ApiResponse, AppState};

const RECENT_ORDERS: i64 = 10;
const LOW_STOCK_THRESHOLD: i32 = 10;
const LOW_STOCK_LIMIT: i64 = 10;
const TOP_PRODUCTS: i64 = 10;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct DashboardStats {
    total_sales: f64,
    total_orders: i64,
    total_products: i64,
    total_customers: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct RecentOrder {
    id: i64,
    total_amount: f64,
    status: String,
    payment_status: String,
    customer_name: String,
    customer_email: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct LowStockItem {
    id: i64,
    name: String,
    image: String,
    stock: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct DashboardData {
    stats: DashboardStats,
    recent_orders: Vec<RecentOrder>,
    low_stock_products: Vec<LowStockItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct DailySales {
    date: String,
    total_sales: f64,
    order_count: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct TopProduct {
    product_id: i64,
    name: Option<String>,
    image: Option<String>,
    total_quantity: i64,
    total_revenue: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct AnalyticsData {
    period_days: i32,
    sales: Vec<DailySales>,
    top_products: Vec<TopProduct>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct AnalyticsQuery {
    pub period: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RoleRequest {
    #[serde(default)]
    pub role: String,
}

fn normalize_period(period: Option<i32>) -> i32 {
    period.unwrap_or(30).clamp(1, 365)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/dashboard
pub(super) async fn dashboard(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiError> {
    let rid = &req_id.0;
    let db_err = |e: storefront_db::DbError| map_db_error(rid.clone(), &e);

    let summary = storefront_db::dashboard_summary(&state.pool)
        .await
        .map_err(db_err)?;
    let recent = storefront_db::recent_orders(&state.pool, RECENT_ORDERS)
        .await
        .map_err(db_err)?;
    let low_stock =
        storefront_db::low_stock_products(&state.pool, LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT)
            .await
            .map_err(db_err)?;

    let data = DashboardData {
        stats: DashboardStats {
            total_sales: money(summary.total_sales),
            total_orders: summary.total_orders,
            total_products: summary.total_products,
            total_customers: summary.total_customers,
        },
        recent_orders: recent
            .into_iter()
            .map(|row| RecentOrder {
                id: row.order.id,
                total_amount: money(row.order.total_amount),
                status: row.order.status,
                payment_status: row.order.payment_status,
                customer_name: row.account_name,
                customer_email: row.account_email,
                created_at: row.order.created_at,
            })
            .collect(),
        low_stock_products: low_stock
            .into_iter()
            .map(|row| LowStockItem {
                id: row.id,
                name: row.name,
                image: row.image,
                stock: row.stock,
            })
            .collect(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/admin/users
pub(super) async fn list_users(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<UserItem>>>, ApiError> {
    let rows = storefront_db::list_users(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = rows.into_iter().map(UserItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// PUT /api/v1/admin/users/{id}/role
pub(super) async fn update_user_role(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(body): Json<RoleRequest>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let rid = &req_id.0;
    let role: Role = body.role.parse().map_err(|e| validation_error(rid, &e))?;

    let row = storefront_db::set_user_role(&state.pool, id, role)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "User not found"))?;

    tracing::info!(admin_id = admin.id, user_id = id, role = %role, "user role changed");
    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// GET /api/v1/admin/analytics?period=<days>
pub(super) async fn analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsData>>, ApiError> {
    let rid = &req_id.0;
    let period_days = normalize_period(query.period);

    let sales = storefront_db::daily_sales(&state.pool, period_days)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    let top = storefront_db::top_products(&state.pool, TOP_PRODUCTS)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = AnalyticsData {
        period_days,
        sales: sales
            .into_iter()
            .map(|row| DailySales {
                date: row.day,
                total_sales: money(row.total_sales),
                order_count: row.order_count,
            })
            .collect(),
        top_products: top
            .into_iter()
            .map(|row| TopProduct {
                product_id: row.product_id,
                name: row.name,
                image: row.image,
                total_quantity: row.total_quantity,
                total_revenue: money(row.total_revenue),
            })
            .collect(),
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analytics_period_defaults_and_clamps() {
        assert_eq!(normalize_period(None), 30);
        assert_eq!(normalize_period(Some(0)), 1);
        assert_eq!(normalize_period(Some(7)), 7);
        assert_eq!(normalize_period(Some(10_000)), 365);
    }
}
