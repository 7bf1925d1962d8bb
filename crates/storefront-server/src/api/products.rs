use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_core::import::{rows_from_body, run_import, CanonicalProduct, ImportReport};
use storefront_core::{import::PLACEHOLDER_IMAGE, Pricing, ProductSort};
use storefront_db::{DbError, PgCatalog, ProductFilters, ProductRow, ProductUpdate};

use crate::middleware::RequestId;

use super::{map_db_error, money, normalize_limit, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct CategoryBrief {
    id: i64,
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProductItem {
    id: i64,
    name: String,
    description: String,
    price: f64,
    previous_price: f64,
    current_price: f64,
    discount: i16,
    image: String,
    images: Vec<String>,
    stock: i32,
    rating: f64,
    brand: String,
    featured: bool,
    categories: Vec<CategoryBrief>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        let categories = row
            .category_ids
            .iter()
            .zip(row.category_names)
            .map(|(&id, name)| CategoryBrief { id, name })
            .collect();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: money(row.price),
            previous_price: money(row.previous_price),
            current_price: money(row.current_price),
            discount: row.discount,
            image: row.image,
            images: row.images,
            stock: row.stock,
            rating: money(row.rating),
            brand: row.brand,
            featured: row.featured,
            categories,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    items: Vec<ProductItem>,
    count: usize,
    total: i64,
    page: i64,
    pages: i64,
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<i64>,
    pub featured: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<f64>,
    #[serde(alias = "previous_price")]
    pub previous_price: Option<f64>,
    #[serde(alias = "current_price")]
    pub current_price: Option<f64>,
    #[serde(default, alias = "category", alias = "category_ids")]
    pub categories: Vec<i64>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub brand: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(alias = "previous_price")]
    pub previous_price: Option<f64>,
    #[serde(alias = "current_price")]
    pub current_price: Option<f64>,
    #[serde(alias = "category", alias = "category_ids")]
    pub categories: Option<Vec<i64>>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub stock: Option<i32>,
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub featured: Option<bool>,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Explicit `images` win over a lone `image`; blanks are dropped.
fn collect_images(image: Option<&str>, images: Option<&[String]>) -> Vec<String> {
    let from_list: Vec<String> = images
        .unwrap_or_default()
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();
    if !from_list.is_empty() {
        return from_list;
    }
    image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| vec![s.to_owned()])
        .unwrap_or_default()
}

fn validate_stock(req_id: &str, stock: i32) -> Result<i32, ApiError> {
    if stock < 0 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "Stock cannot be negative",
        ));
    }
    Ok(stock)
}

fn validate_rating(req_id: &str, rating: f64) -> Result<f64, ApiError> {
    if !(0.0..=5.0).contains(&rating) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "Rating must be between 0 and 5",
        ));
    }
    Ok(rating)
}

fn validate_categories(req_id: &str, ids: &[i64]) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "Please select at least one category",
        ));
    }
    Ok(())
}

fn map_write_error(req_id: &str, e: &DbError) -> ApiError {
    match e {
        DbError::MissingReference(what) => {
            ApiError::new(req_id, "validation_error", format!("Unknown {what}"))
        }
        other => map_db_error(req_id.to_owned(), other),
    }
}

async fn load_product(state: &AppState, req_id: &str, id: i64) -> Result<ProductRow, ApiError> {
    storefront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(req_id, "not_found", "Product not found"))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let rid = &req_id.0;
    let sort = match query.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw
            .parse::<ProductSort>()
            .map_err(|e| ApiError::new(rid, "bad_request", e.to_string()))?,
        None => ProductSort::default(),
    };
    let limit = normalize_limit(query.limit);
    let page = query.page.unwrap_or(1).max(1);
    let featured = query
        .featured
        .as_deref()
        .filter(|f| !f.is_empty())
        .map(|f| f == "true");

    let result = storefront_db::list_products(
        &state.pool,
        &ProductFilters {
            category_id: query.category,
            featured,
            search: query.search.as_deref(),
            sort,
            limit,
            offset: (page - 1).saturating_mul(limit),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    let items: Vec<ProductItem> = result.items.into_iter().map(ProductItem::from).collect();
    let data = ProductListData {
        count: items.len(),
        total: result.total,
        page,
        pages: (result.total + limit - 1) / limit,
        items,
    };
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = load_product(&state, &req_id.0, id).await?;
    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "Please provide product name",
        ));
    }
    validate_categories(rid, &body.categories)?;
    let stock = validate_stock(rid, body.stock.unwrap_or(0))?;

    let mut images = collect_images(body.image.as_deref(), body.images.as_deref());
    if images.is_empty() {
        images.push(PLACEHOLDER_IMAGE.to_owned());
    }

    let product = CanonicalProduct {
        name: name.to_owned(),
        description: body.description.trim().to_owned(),
        pricing: Pricing::for_create(body.price, body.previous_price, body.current_price),
        category_ids: body.categories.clone(),
        image: images[0].clone(),
        images,
        stock,
        featured: body.featured,
        brand: body.brand.clone(),
    };

    let id = storefront_db::create_product(&state.pool, &product)
        .await
        .map_err(|e| map_write_error(rid, &e))?;
    let row = load_product(&state, rid, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(row.into(), req_id.0)),
    ))
}

/// PUT /api/v1/products/{id}
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let existing = load_product(&state, rid, id).await?;

    let name = body.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "Please provide product name",
        ));
    }
    if let Some(ids) = &body.categories {
        validate_categories(rid, ids)?;
    }
    let stock = body.stock.map(|s| validate_stock(rid, s)).transpose()?;
    let rating = body.rating.map(|r| validate_rating(rid, r)).transpose()?;

    let price_changed =
        body.price.is_some() || body.previous_price.is_some() || body.current_price.is_some();
    let pricing = price_changed.then(|| {
        existing
            .pricing()
            .apply_update(body.price, body.previous_price, body.current_price)
    });

    let images = (body.images.is_some() || body.image.is_some())
        .then(|| collect_images(body.image.as_deref(), body.images.as_deref()))
        .filter(|images| !images.is_empty());

    let update = ProductUpdate {
        name: name.map(ToOwned::to_owned),
        description: body.description.map(|d| d.trim().to_owned()),
        pricing,
        category_ids: body.categories,
        images,
        stock,
        rating,
        brand: body.brand,
        featured: body.featured,
    };

    let row = storefront_db::update_product(&state.pool, id, &update)
        .await
        .map_err(|e| map_write_error(rid, &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Product not found"))?;

    Ok(Json(ApiResponse::new(row.into(), req_id.0)))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let rid = &req_id.0;
    let deleted = storefront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::new(rid, "not_found", "Product not found"));
    }

    tracing::info!(product_id = id, "product deleted");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": true }),
        req_id.0,
    )))
}

/// POST /api/v1/products/bulk. Body is `{ "products": [ {...}, ... ] }`.
///
/// A body that is not JSON (wrong content type or malformed) is a
/// `validation_error` in the usual envelope.
pub(super) async fn bulk_create_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    let rid = &req_id.0;
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "bulk import body rejected");
        ApiError::new(
            rid,
            "validation_error",
            format!("Request body must be JSON: {}", rejection.body_text()),
        )
    })?;
    let rows =
        rows_from_body(&body).map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))?;

    let catalog = PgCatalog::new(state.pool.clone());
    let report = run_import(&catalog, rows)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(report, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_image_list_wins_over_single_image() {
        let images = vec![" a.jpg ".to_string(), String::new(), "b.jpg".to_string()];
        assert_eq!(
            collect_images(Some("c.jpg"), Some(images.as_slice())),
            vec!["a.jpg".to_string(), "b.jpg".to_string()]
        );
        assert_eq!(collect_images(Some(" c.jpg"), Some(&[] as &[String])), vec!["c.jpg".to_string()]);
        assert!(collect_images(Some("  "), None).is_empty());
    }

    #[test]
    fn create_request_accepts_snake_case_price_aliases() {
        let body: CreateProductRequest = serde_json::from_value(serde_json::json!({
            "name": "Chai",
            "previous_price": 10.0,
            "currentPrice": 8.0,
            "category": [3]
        }))
        .unwrap();
        assert_eq!(body.previous_price, Some(10.0));
        assert_eq!(body.current_price, Some(8.0));
        assert_eq!(body.categories, vec![3]);
    }
}
