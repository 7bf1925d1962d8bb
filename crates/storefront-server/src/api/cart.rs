//! The signed-in user's cart. Every mutation answers with the refreshed
//! cart so clients never need a second round trip.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_db::{CartItemRow, DbError};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, money, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CartLine {
    product_id: i64,
    name: String,
    image: String,
    unit_price: f64,
    quantity: i32,
    line_total: f64,
    stock: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct CartView {
    items: Vec<CartLine>,
    item_count: i64,
    subtotal: f64,
}

impl CartView {
    fn from_rows(rows: Vec<CartItemRow>) -> Self {
        let subtotal: Decimal = rows.iter().map(CartItemRow::line_total).sum();
        let item_count = rows.iter().map(|r| i64::from(r.quantity)).sum();
        let items = rows
            .into_iter()
            .map(|row| CartLine {
                line_total: money(row.line_total()),
                product_id: row.product_id,
                name: row.name,
                image: row.image,
                unit_price: money(row.unit_price),
                quantity: row.quantity,
                stock: row.stock,
            })
            .collect();
        Self {
            items,
            item_count,
            subtotal: money(subtotal),
        }
    }
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub(super) struct AddToCartRequest {
    #[serde(alias = "productId")]
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCartRequest {
    pub quantity: i32,
}

async fn cart_view(
    state: &AppState,
    req_id: RequestId,
    user_id: i64,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rows = storefront_db::list_cart_items(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(CartView::from_rows(rows), req_id.0)))
}

/// GET /api/v1/cart
pub(super) async fn get_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    cart_view(&state, req_id, user.id).await
}

/// POST /api/v1/cart/add
pub(super) async fn add_to_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rid = &req_id.0;
    if body.quantity < 1 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "Quantity must be at least 1",
        ));
    }

    match storefront_db::add_cart_item(&state.pool, user.id, body.product_id, body.quantity).await
    {
        Ok(()) => {}
        Err(DbError::MissingReference(_)) => {
            return Err(ApiError::new(rid, "not_found", "Product not found"))
        }
        Err(e) => return Err(map_db_error(rid.clone(), &e)),
    }

    cart_view(&state, req_id, user.id).await
}

/// PUT /api/v1/cart/update/{product_id}. A quantity of zero or less removes
/// the line.
pub(super) async fn update_cart_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<i64>,
    Json(body): Json<UpdateCartRequest>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rid = &req_id.0;
    let found =
        storefront_db::set_cart_item_quantity(&state.pool, user.id, product_id, body.quantity)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !found {
        return Err(ApiError::new(rid, "not_found", "Item not found in cart"));
    }

    cart_view(&state, req_id, user.id).await
}

/// DELETE /api/v1/cart/remove/{product_id}
pub(super) async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let rid = &req_id.0;
    let removed = storefront_db::remove_cart_item(&state.pool, user.id, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(rid, "not_found", "Item not found in cart"));
    }

    cart_view(&state, req_id, user.id).await
}

/// DELETE /api/v1/cart/clear
pub(super) async fn clear_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let removed = storefront_db::clear_cart(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    tracing::debug!(user_id = user.id, removed, "cart cleared");

    cart_view(&state, req_id, user.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_view_sums_quantities_and_line_totals() {
        let rows = vec![
            CartItemRow {
                product_id: 1,
                name: "Rice".to_string(),
                image: "rice.jpg".to_string(),
                unit_price: Decimal::new(250, 2),
                stock: 10,
                quantity: 2,
            },
            CartItemRow {
                product_id: 2,
                name: "Tea".to_string(),
                image: "tea.jpg".to_string(),
                unit_price: Decimal::new(399, 2),
                stock: 5,
                quantity: 1,
            },
        ];

        let view = CartView::from_rows(rows);
        assert_eq!(view.item_count, 3);
        assert!((view.subtotal - 8.99).abs() < 1e-9);
        assert!((view.items[0].line_total - 5.0).abs() < 1e-9);
    }

    #[test]
    fn add_request_defaults_quantity_to_one() {
        let body: AddToCartRequest =
            serde_json::from_value(serde_json::json!({ "productId": 7 })).unwrap();
        assert_eq!(body.product_id, 7);
        assert_eq!(body.quantity, 1);
    }
}
