use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::{
    order_total, validate_order_lines, Address, OrderLine, OrderStatus, PaymentStatus,
    DEFAULT_PAYMENT_METHOD,
};
use storefront_db::{DbError, NewOrder, OrderItemRow, OrderRow, OrderWithCustomerRow};
use storefront_notify::{notify_order_status, NotifyOutcome};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, money, validation_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct OrderItemView {
    /// `None` once the product has been deleted.
    product_id: Option<i64>,
    name: Option<String>,
    image: Option<String>,
    quantity: i32,
    price: f64,
}

impl From<OrderItemRow> for OrderItemView {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.product_name,
            image: row.product_image,
            quantity: row.quantity,
            price: money(row.price),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CustomerBrief {
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderView {
    id: i64,
    user_id: i64,
    status: String,
    payment_status: String,
    payment_method: String,
    total_amount: f64,
    customer_name: String,
    customer_email: Option<String>,
    customer_phone: Option<String>,
    shipping_address: Address,
    items: Vec<OrderItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<CustomerBrief>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderView {
    fn new(row: OrderRow, items: Vec<OrderItemView>, customer: Option<CustomerBrief>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            total_amount: money(row.total_amount),
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            shipping_address: row.shipping_address.0,
            items,
            customer,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct StatusUpdateData {
    order: OrderView,
    message: String,
    #[serde(rename = "emailSent", skip_serializing_if = "Option::is_none")]
    email_sent: Option<bool>,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct OrderItemRequest {
    #[serde(alias = "productId", alias = "product")]
    pub product_id: i64,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    #[serde(default, alias = "orderItems")]
    pub items: Vec<OrderItemRequest>,
    #[serde(default, alias = "shippingAddress")]
    pub shipping_address: Address,
    #[serde(alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(alias = "customerEmail")]
    pub customer_email: Option<String>,
    #[serde(alias = "customerPhone")]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateStatusRequest {
    pub status: Option<String>,
    #[serde(alias = "paymentStatus")]
    pub payment_status: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Loads the items of every order and pairs them up, preserving order.
async fn with_items(
    state: &AppState,
    req_id: &str,
    orders: Vec<(OrderRow, Option<CustomerBrief>)>,
) -> Result<Vec<OrderView>, ApiError> {
    let ids: Vec<i64> = orders.iter().map(|(order, _)| order.id).collect();
    let rows = storefront_db::list_order_items(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?;

    let mut by_order: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row.into());
    }

    Ok(orders
        .into_iter()
        .map(|(order, customer)| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderView::new(order, items, customer)
        })
        .collect())
}

async fn single_view(
    state: &AppState,
    req_id: &str,
    order: OrderRow,
    customer: Option<CustomerBrief>,
) -> Result<OrderView, ApiError> {
    let mut views = with_items(state, req_id, vec![(order, customer)]).await?;
    views
        .pop()
        .ok_or_else(|| ApiError::new(req_id, "internal_error", "order view missing"))
}

fn split_customer(row: OrderWithCustomerRow) -> (OrderRow, Option<CustomerBrief>) {
    (
        row.order,
        Some(CustomerBrief {
            name: row.account_name,
            email: row.account_email,
        }),
    )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/orders
pub(super) async fn list_my_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let rid = &req_id.0;
    let rows = storefront_db::list_orders_for_user(&state.pool, user.id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = with_items(&state, rid, rows.into_iter().map(|o| (o, None)).collect()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/orders/{id}. Owners and admins only.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_order_with_customer(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Order not found"))?;

    if row.order.user_id != user.id && !user.is_admin() {
        return Err(ApiError::new(
            rid,
            "forbidden",
            "Not authorized to access this order",
        ));
    }

    let (order, customer) = split_customer(row);
    let data = single_view(&state, rid, order, customer).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/orders. Clears the caller's cart in the same transaction.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>), ApiError> {
    let rid = &req_id.0;
    let lines: Vec<OrderLine> = body
        .items
        .iter()
        .map(|item| OrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
        })
        .collect();
    validate_order_lines(&lines).map_err(|e| validation_error(rid, &e))?;

    let customer_name = match non_blank(body.customer_name.as_deref()) {
        Some(name) => name.to_owned(),
        None => storefront_db::get_user(&state.pool, user.id)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?
            .map(|account| account.name)
            .unwrap_or_default(),
    };

    let order = storefront_db::create_order(
        &state.pool,
        &NewOrder {
            user_id: user.id,
            lines: &lines,
            total_amount: order_total(&lines),
            shipping_address: &body.shipping_address,
            payment_method: non_blank(body.payment_method.as_deref())
                .unwrap_or(DEFAULT_PAYMENT_METHOD),
            customer_name: &customer_name,
            customer_email: non_blank(body.customer_email.as_deref()),
            customer_phone: non_blank(body.customer_phone.as_deref()),
        },
    )
    .await
    .map_err(|e| match e {
        DbError::MissingReference(what) => {
            ApiError::new(rid, "validation_error", format!("Unknown {what}"))
        }
        other => map_db_error(rid.clone(), &other),
    })?;

    let data = single_view(&state, rid, order, None).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(data, req_id.0)),
    ))
}

/// PUT /api/v1/orders/{id}/status
///
/// The update is committed before any customer email goes out; a failed
/// send is reported in the response and never fails the request.
pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<StatusUpdateData>>, ApiError> {
    let rid = &req_id.0;
    let status = non_blank(body.status.as_deref())
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| validation_error(rid, &e))?;
    let payment_status = non_blank(body.payment_status.as_deref())
        .map(str::parse::<PaymentStatus>)
        .transpose()
        .map_err(|e| validation_error(rid, &e))?;
    if status.is_none() && payment_status.is_none() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "Provide a status or payment_status",
        ));
    }

    let row = storefront_db::update_order_status(&state.pool, id, status, payment_status)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Order not found"))?;
    tracing::info!(
        order_id = id,
        status = status.map(OrderStatus::as_str),
        payment_status = payment_status.map(PaymentStatus::as_str),
        "order status updated"
    );

    let outcome = match status {
        Some(status) => {
            notify_order_status(
                &state.mailer,
                &state.store_name,
                status,
                row.order.id,
                row.order.customer_email.as_deref(),
                Some(row.account_email.as_str()),
            )
            .await
        }
        None => NotifyOutcome::Skipped,
    };

    let (order, customer) = split_customer(row);
    let order = single_view(&state, rid, order, customer).await?;
    Ok(Json(ApiResponse::new(
        StatusUpdateData {
            order,
            message: format!("Order updated successfully.{}", outcome.message_suffix()),
            email_sent: outcome.email_sent(),
        },
        req_id.0,
    )))
}

/// GET /api/v1/orders/admin/all
pub(super) async fn list_all_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let rid = &req_id.0;
    let rows = storefront_db::list_all_orders(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = with_items(&state, rid, rows.into_iter().map(split_customer).collect()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
