//! Bulk product import.
//!
//! A batch is a list of loosely-shaped rows (CSV records or JSON objects).
//! Each row is resolved against the existing categories and persisted on its
//! own; a bad row is recorded in the [`ImportReport`] and never stops the
//! batch.

mod fields;
mod report;
mod resolve;

use std::fmt::Display;
use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub use fields::ImportRow;
pub use report::{CreatedRow, FailedRow, ImportReport, RowOutcome};
pub use resolve::{
    resolve_row, CanonicalProduct, CategoryIndex, CategoryRef, RowError, PLACEHOLDER_IMAGE,
};

/// Persistence the importer needs: enumerate categories once, then create
/// products one at a time.
pub trait CatalogStore {
    type Error: Display + Send;

    /// All categories, in a stable order. The first one is the fallback for
    /// rows whose category does not match.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<CategoryRef>, Self::Error>> + Send;

    /// Persists one product and returns its id.
    fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> impl Future<Output = Result<i64, Self::Error>> + Send;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Request body must include a non-empty \"products\" array")]
    InvalidBody,
}

/// Extracts the `products` array from an import request body.
///
/// # Errors
///
/// Returns [`ImportError::InvalidBody`] when `products` is missing, not an
/// array, or empty.
pub fn rows_from_body(body: &Value) -> Result<&[Value], ImportError> {
    body.get("products")
        .and_then(Value::as_array)
        .filter(|rows| !rows.is_empty())
        .map(Vec::as_slice)
        .ok_or(ImportError::InvalidBody)
}

/// Resolves and persists every row in order.
///
/// # Errors
///
/// Only a failure to list categories aborts the batch. Per-row resolution
/// and persistence failures are reported in the returned [`ImportReport`].
pub async fn run_import<S>(store: &S, rows: &[Value]) -> Result<ImportReport, S::Error>
where
    S: CatalogStore + Sync,
{
    let categories = CategoryIndex::new(&store.list_categories().await?);
    let empty = ImportRow::new();

    let mut outcomes = Vec::with_capacity(rows.len());
    for (idx, value) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let row = value.as_object().unwrap_or(&empty);
        let outcome = match import_row(store, row, &categories).await {
            Ok((id, name)) => RowOutcome::Created(CreatedRow {
                row: row_number,
                id,
                name,
            }),
            Err(err) => {
                tracing::warn!(row = row_number, error = %err, "import row skipped");
                RowOutcome::Failed(FailedRow {
                    row: row_number,
                    message: err.to_string(),
                })
            }
        };
        outcomes.push(outcome);
    }

    let report = ImportReport::from_outcomes(outcomes);
    tracing::info!(
        created = report.created,
        failed = report.failed,
        total = report.total,
        "product import finished"
    );
    Ok(report)
}

async fn import_row<S>(
    store: &S,
    row: &ImportRow,
    categories: &CategoryIndex,
) -> Result<(i64, String), RowError>
where
    S: CatalogStore + Sync,
{
    let product = resolve_row(row, categories)?;
    let id = store
        .create_product(&product)
        .await
        .map_err(|e| RowError::Persist(e.to_string()))?;
    Ok((id, product.name))
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
