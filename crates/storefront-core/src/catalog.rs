use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::CoreError;

static WHITESPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static NON_SLUG_CHARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid regex"));

/// URL slug for a category name: lower-cased, whitespace runs become `-`,
/// anything outside `[A-Za-z0-9_-]` is dropped.
///
/// ```
/// assert_eq!(storefront_core::category_slug("Fresh & Frozen Fish"), "fresh--frozen-fish");
/// ```
#[must_use]
pub fn category_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let dashed = WHITESPACE_RUN_RE.replace_all(&lowered, "-");
    NON_SLUG_CHARS_RE.replace_all(&dashed, "").into_owned()
}

/// Sortable product columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSortKey {
    CreatedAt,
    Price,
    Name,
    Rating,
}

/// A `sort` query value such as `-price`: a leading `-` means descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductSort {
    pub key: ProductSortKey,
    pub descending: bool,
}

impl Default for ProductSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            key: ProductSortKey::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for ProductSort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (descending, field) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let key = match field {
            "createdAt" => ProductSortKey::CreatedAt,
            "price" => ProductSortKey::Price,
            "name" => ProductSortKey::Name,
            "rating" => ProductSortKey::Rating,
            _ => return Err(CoreError::InvalidSort(s.to_string())),
        };
        Ok(Self { key, descending })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_whitespace_and_drops_symbols() {
        assert_eq!(category_slug("Rice & Grains"), "rice--grains");
        assert_eq!(category_slug("  Snacks   Sweets "), "-snacks-sweets-");
        assert_eq!(category_slug("Ready_Meals"), "ready_meals");
        assert_eq!(category_slug("Café Items"), "caf-items");
    }

    #[test]
    fn sort_parses_direction_prefix() {
        assert_eq!(
            "-price".parse::<ProductSort>().unwrap(),
            ProductSort {
                key: ProductSortKey::Price,
                descending: true
            }
        );
        assert_eq!(
            "name".parse::<ProductSort>().unwrap(),
            ProductSort {
                key: ProductSortKey::Name,
                descending: false
            }
        );
    }

    #[test]
    fn sort_rejects_unknown_columns() {
        for raw in ["stock", "-", "", "price;drop table products"] {
            assert!(raw.parse::<ProductSort>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn default_sort_is_newest_first() {
        let sort = ProductSort::default();
        assert_eq!(sort.key, ProductSortKey::CreatedAt);
        assert!(sort.descending);
    }
}
