use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::category_slug;
use storefront_db::{CategoryRow, CategoryUpdate, DbError, NewCategory};

use crate::middleware::RequestId;

use super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState};

const DUPLICATE_CATEGORY: &str = "A category with that name already exists";

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    id: i64,
    name: String,
    slug: String,
    description: String,
    icon: String,
    color: String,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for CategoryItem {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            icon: row.icon,
            color: row.color,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub priority: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub priority: Option<i32>,
}

fn checked_name<'a>(req_id: &str, name: &'a str) -> Result<(&'a str, String), ApiError> {
    let name = name.trim();
    let slug = category_slug(name);
    if name.is_empty() || slug.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "Please provide a category name",
        ));
    }
    Ok((name, slug))
}

/// GET /api/v1/categories
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let rows = storefront_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(CategoryItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/categories/{id}
pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let row = storefront_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "Category not found"))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// POST /api/v1/categories
pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryItem>>), ApiError> {
    let rid = &req_id.0;
    let (name, slug) = checked_name(rid, &body.name)?;

    let row = storefront_db::create_category(
        &state.pool,
        &NewCategory {
            name,
            slug: &slug,
            description: body.description.as_deref().map(str::trim),
            icon: body.icon.as_deref(),
            color: body.color.as_deref(),
            priority: body.priority,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, DUPLICATE_CATEGORY))?;

    tracing::info!(category_id = row.id, slug = %row.slug, "category created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(row.into(), req_id.0)),
    ))
}

/// PUT /api/v1/categories/{id}. Renaming also regenerates the slug.
pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let rid = &req_id.0;
    let renamed = body
        .name
        .as_deref()
        .map(|name| checked_name(rid, name))
        .transpose()?;

    let row = storefront_db::update_category(
        &state.pool,
        id,
        &CategoryUpdate {
            name: renamed.as_ref().map(|(name, _)| *name),
            slug: renamed.as_ref().map(|(_, slug)| slug.as_str()),
            description: body.description.as_deref().map(str::trim),
            icon: body.icon.as_deref(),
            color: body.color.as_deref(),
            priority: body.priority,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, DUPLICATE_CATEGORY))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "Category not found"))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// DELETE /api/v1/categories/{id}
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = match storefront_db::delete_category(&state.pool, id).await {
        Ok(deleted) => deleted,
        Err(DbError::InUse(_)) => {
            return Err(ApiError::new(
                rid,
                "conflict",
                "Category is still assigned to products",
            ))
        }
        Err(e) => return Err(map_db_error(rid.clone(), &e)),
    };
    if !deleted {
        return Err(ApiError::new(rid, "not_found", "Category not found"));
    }

    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}
