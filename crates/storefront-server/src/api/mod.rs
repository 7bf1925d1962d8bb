mod accounts;
mod admin;
mod cart;
mod categories;
mod coupons;
mod orders;
mod products;
mod uploads;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use sqlx::PgPool;
use storefront_core::CoreError;
use storefront_db::DbError;
use storefront_notify::Mailer;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::TokenKeys;
use crate::middleware::{
    enforce_rate_limit, request_id, require_admin, require_user, AuthState, RateLimitState,
    RequestId,
};
use crate::storage::{ImageStore, MAX_IMAGE_BYTES};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: TokenKeys,
    pub mailer: Mailer,
    pub images: ImageStore,
    pub store_name: Arc<str>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "payload_too_large" => StatusCode::PAYLOAD_TOO_LARGE,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(20).clamp(1, 100)
}

pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Maps a unique violation to `conflict` with `message`; anything else is a
/// database failure.
pub(super) fn map_unique_violation(request_id: &str, error: &DbError, message: &str) -> ApiError {
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", message);
    }
    map_db_error(request_id.to_owned(), error)
}

pub(super) fn validation_error(request_id: &str, error: &CoreError) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

/// Money columns are `NUMERIC`; JSON carries them as numbers.
pub(super) fn money(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/signup", post(accounts::signup))
        .route("/api/v1/auth/login", post(accounts::login))
        .route("/api/v1/auth/logout", get(accounts::logout))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/{id}", get(products::get_product))
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/categories/{id}", get(categories::get_category))
        .route("/api/v1/coupons/verify", post(coupons::verify_coupon))
}

fn customer_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/me", get(accounts::me))
        .route("/api/v1/auth/profile", put(accounts::update_profile))
        .route("/api/v1/cart", get(cart::get_cart))
        .route("/api/v1/cart/add", post(cart::add_to_cart))
        .route("/api/v1/cart/update/{product_id}", put(cart::update_cart_item))
        .route("/api/v1/cart/remove/{product_id}", delete(cart::remove_from_cart))
        .route("/api/v1/cart/clear", delete(cart::clear_cart))
        .route(
            "/api/v1/orders",
            get(orders::list_my_orders).post(orders::create_order),
        )
        .route("/api/v1/orders/{id}", get(orders::get_order))
        .layer(axum::middleware::from_fn_with_state(auth, require_user))
}

fn admin_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", post(products::create_product))
        .route(
            "/api/v1/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/api/v1/products/bulk", post(products::bulk_create_products))
        .route("/api/v1/categories", post(categories::create_category))
        .route(
            "/api/v1/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/api/v1/orders/admin/all", get(orders::list_all_orders))
        .route("/api/v1/orders/{id}/status", put(orders::update_order_status))
        .route(
            "/api/v1/coupons",
            get(coupons::list_coupons).post(coupons::create_coupon),
        )
        .route("/api/v1/coupons/{id}", delete(coupons::delete_coupon))
        .route("/api/v1/admin/dashboard", get(admin::dashboard))
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/{id}/role", put(admin::update_user_role))
        .route("/api/v1/admin/analytics", get(admin::analytics))
        .route(
            "/api/v1/uploads/product",
            // Headroom over the image cap so oversize files reach the handler
            // and get a 413 envelope instead of a bare rejection.
            post(uploads::upload_product_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES * 2)),
        )
        .route("/api/v1/uploads/{public_id}", delete(uploads::delete_image))
        .layer(axum::middleware::from_fn_with_state(auth, require_admin))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let auth = AuthState {
        tokens: state.tokens.clone(),
        pool: state.pool.clone(),
    };

    let api = Router::new()
        .merge(public_router())
        .merge(customer_router(auth.clone()))
        .merge(admin_router(auth))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(api)
        .nest_service("/uploads", ServeDir::new(state.images.root()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match storefront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
