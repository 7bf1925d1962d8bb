use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::{is_expired, normalize_coupon_code, validate_coupon};
use storefront_db::CouponRow;

use crate::middleware::RequestId;

use super::{map_db_error, validation_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct CouponItem {
    id: i64,
    code: String,
    discount: i32,
    expiry_date: DateTime<Utc>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<CouponRow> for CouponItem {
    fn from(row: CouponRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            discount: row.discount,
            expiry_date: row.expiry_date,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct VerifiedCoupon {
    code: String,
    discount: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateCouponRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub discount: i32,
    #[serde(alias = "expiryDate")]
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyCouponRequest {
    #[serde(default)]
    pub code: String,
}

/// GET /api/v1/coupons
pub(super) async fn list_coupons(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CouponItem>>>, ApiError> {
    let rows = storefront_db::list_coupons(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let data = rows.into_iter().map(CouponItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/coupons
pub(super) async fn create_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CouponItem>>), ApiError> {
    let rid = &req_id.0;
    let code = validate_coupon(&body.code, body.discount).map_err(|e| validation_error(rid, &e))?;
    let expiry_date = body.expiry_date.ok_or_else(|| {
        ApiError::new(rid, "validation_error", "Please provide an expiry date")
    })?;

    let row = storefront_db::create_coupon(&state.pool, &code, body.discount, expiry_date)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(rid, "bad_request", "Coupon code already exists")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(row.into(), req_id.0)),
    ))
}

/// DELETE /api/v1/coupons/{id}
pub(super) async fn delete_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = storefront_db::delete_coupon(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::new(rid, "not_found", "Coupon not found"));
    }
    Ok(Json(ApiResponse::new(serde_json::json!({}), req_id.0)))
}

/// POST /api/v1/coupons/verify
pub(super) async fn verify_coupon(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<VerifyCouponRequest>,
) -> Result<Json<ApiResponse<VerifiedCoupon>>, ApiError> {
    let rid = &req_id.0;
    let code = normalize_coupon_code(&body.code);

    let coupon = storefront_db::find_active_coupon(&state.pool, &code)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Invalid coupon code"))?;

    if is_expired(coupon.expiry_date, Utc::now()) {
        return Err(ApiError::new(rid, "bad_request", "Coupon has expired"));
    }

    Ok(Json(ApiResponse::new(
        VerifiedCoupon {
            code: coupon.code,
            discount: coupon.discount,
        },
        req_id.0,
    )))
}
