//! Row → [`CanonicalProduct`] resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::Pricing;

use super::fields::{
    first_filled, first_present, is_affirmative, parse_integer_prefix, parse_money, text_field,
    url_list, value_text, ImportRow,
};

pub const NAME_KEYS: &[&str] = &["name", "productTitle", "title", "Product Title"];
pub const CATEGORY_KEYS: &[&str] = &["category", "categories", "Categories", "Category"];
pub const PREVIOUS_PRICE_KEYS: &[&str] = &["previousPrice", "previous_price", "Previous Price (£)"];
pub const CURRENT_PRICE_KEYS: &[&str] = &["currentPrice", "current_price", "Current Price (£)"];
pub const IMAGE_KEYS: &[&str] = &[
    "imageUrls",
    "image_urls",
    "Product Images",
    "Image URLs",
    "Image URLs (multiple, separated by commas)",
    "images",
    "image",
];
pub const FEATURED_KEYS: &[&str] = &["featured", "Featured Product (Yes/No)"];
pub const STOCK_KEYS: &[&str] = &["stock", "stockQuantity", "Stock Quantity"];
pub const DESCRIPTION_KEYS: &[&str] = &["description", "productDescription", "Product Description"];

/// Image used when a row carries no usable image URL.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x310";

/// Minimal view of a stored category: enough to resolve names to ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Case-insensitive category name → id lookup, built once per import batch.
///
/// `fallback` is the first category in the order the store enumerated them.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    by_name: HashMap<String, i64>,
    fallback: Option<i64>,
}

impl CategoryIndex {
    #[must_use]
    pub fn new(categories: &[CategoryRef]) -> Self {
        let by_name = categories
            .iter()
            .map(|c| (c.name.trim().to_lowercase(), c.id))
            .collect();
        Self {
            by_name,
            fallback: categories.first().map(|c| c.id),
        }
    }

    /// Resolves a raw category cell, falling back to the first category.
    fn resolve(&self, raw: &str) -> Option<i64> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return self.fallback;
        }
        self.by_name.get(&key).copied().or(self.fallback)
    }
}

/// A fully-resolved product ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub pricing: Pricing,
    /// Category ids; never empty.
    pub category_ids: Vec<i64>,
    /// Primary image, always `images[0]`.
    pub image: String,
    pub images: Vec<String>,
    pub stock: i32,
    pub featured: bool,
    pub brand: Option<String>,
}

/// Why a single row could not be turned into a product.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("Product title is required")]
    MissingName,

    #[error("No category in CSV and no categories exist in database. Create a category first.")]
    NoCategory,

    #[error("{0}")]
    Persist(String),
}

/// Resolves one import row against the batch's category index.
///
/// # Errors
///
/// Returns [`RowError::MissingName`] when no synonym yields a non-blank
/// name, or [`RowError::NoCategory`] when the store has no categories.
pub fn resolve_row(row: &ImportRow, categories: &CategoryIndex) -> Result<CanonicalProduct, RowError> {
    let name = text_field(row, NAME_KEYS);
    if name.is_empty() {
        return Err(RowError::MissingName);
    }

    let category_name = text_field(row, CATEGORY_KEYS);
    let category_id = categories
        .resolve(&category_name)
        .ok_or(RowError::NoCategory)?;

    let pricing = resolve_pricing(row);

    let mut images = url_list(first_filled(row, IMAGE_KEYS));
    if images.is_empty() {
        images.push(PLACEHOLDER_IMAGE.to_string());
    }
    let image = images[0].clone();

    let featured = is_affirmative(first_present(row, FEATURED_KEYS));

    let stock = first_present(row, STOCK_KEYS)
        .and_then(|v| parse_integer_prefix(&value_text(v)))
        .map_or(0, |n| i32::try_from(n.max(0)).unwrap_or(i32::MAX));

    Ok(CanonicalProduct {
        name,
        description: text_field(row, DESCRIPTION_KEYS),
        pricing,
        category_ids: vec![category_id],
        image,
        images,
        stock,
        featured,
        brand: None,
    })
}

/// Previous price falls back to 0; current price falls back to the raw
/// previous-price cell and then to the parsed previous price.
fn resolve_pricing(row: &ImportRow) -> Pricing {
    let previous_raw = first_present(row, PREVIOUS_PRICE_KEYS);
    let current_raw = first_present(row, CURRENT_PRICE_KEYS).or(previous_raw);

    let previous = previous_raw
        .and_then(parse_money)
        .map_or(0.0, |v| v.max(0.0));
    let current = current_raw.and_then(parse_money).map_or(0.0, |v| v.max(0.0));

    Pricing::from_pair(previous, current)
}
