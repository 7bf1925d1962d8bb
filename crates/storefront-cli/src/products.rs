//! `products import`: feeds a CSV or JSON file through the bulk importer.

use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use serde_json::{Map, Value};
use storefront_core::import::{
    rows_from_body, run_import, CanonicalProduct, CatalogStore, CategoryRef, ImportReport,
};
use storefront_db::{DbError, PgCatalog};

/// Reads the category list from the database but never writes. Created
/// products get sequential placeholder ids so the report stays readable.
struct DryRunCatalog {
    pool: sqlx::PgPool,
    next_id: AtomicI64,
}

impl DryRunCatalog {
    fn new(pool: sqlx::PgPool) -> Self {
        Self {
            pool,
            next_id: AtomicI64::new(1),
        }
    }
}

impl CatalogStore for DryRunCatalog {
    type Error = DbError;

    async fn list_categories(&self) -> Result<Vec<CategoryRef>, DbError> {
        storefront_db::list_category_refs(&self.pool).await
    }

    async fn create_product(&self, product: &CanonicalProduct) -> Result<i64, DbError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        println!(
            "dry-run: would create '{}' (price {:.2}, discount {}%, stock {}, categories {:?})",
            product.name,
            product.pricing.price,
            product.pricing.discount,
            product.stock,
            product.category_ids,
        );
        Ok(id)
    }
}

/// One JSON object per CSV record, keyed by the header row. Every cell is a
/// string; short records simply lack the trailing keys.
fn rows_from_csv<R: Read>(reader: R) -> anyhow::Result<Vec<Value>> {
    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(key, cell)| (key.to_string(), Value::String(cell.to_string())))
            .collect();
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// Accepts a bare array of rows or an object carrying a `products` array.
fn rows_from_json(document: Value) -> anyhow::Result<Vec<Value>> {
    match document {
        Value::Array(rows) => Ok(rows),
        other => Ok(rows_from_body(&other)?.to_vec()),
    }
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<Value>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("csv") => rows_from_csv(std::fs::File::open(path)?)?,
        Some("json") => {
            let text = std::fs::read_to_string(path)?;
            rows_from_json(serde_json::from_str(&text)?)?
        }
        _ => anyhow::bail!(
            "unsupported import file '{}': expected a .csv or .json extension",
            path.display()
        ),
    };

    if rows.is_empty() {
        anyhow::bail!("'{}' contains no product rows", path.display());
    }
    Ok(rows)
}

fn print_report(report: &ImportReport) -> anyhow::Result<()> {
    for failure in &report.errors {
        println!("row {}: {}", failure.row, failure.message);
    }
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Imports every row of `path`, reporting per-row failures without stopping.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the category
/// list cannot be loaded. Individual row failures are part of the report.
pub(crate) async fn run_products_import(
    pool: &sqlx::PgPool,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let rows = read_rows(path)?;
    tracing::info!(rows = rows.len(), dry_run, file = %path.display(), "starting product import");

    let report = if dry_run {
        run_import(&DryRunCatalog::new(pool.clone()), &rows).await?
    } else {
        run_import(&PgCatalog::new(pool.clone()), &rows).await?
    };

    tracing::info!(
        created = report.created,
        failed = report.failed,
        total = report.total,
        "product import finished"
    );
    print_report(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_records_become_string_rows() {
        let data = "Product Title,Current Price (£),Stock Quantity\n\
                    Mango Juice,1.50,12\n\
                    Crisps,\"£0.99\"\n";
        let rows = rows_from_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            json!({
                "Product Title": "Mango Juice",
                "Current Price (£)": "1.50",
                "Stock Quantity": "12"
            })
        );
        assert_eq!(
            rows[1],
            json!({ "Product Title": "Crisps", "Current Price (£)": "£0.99" })
        );
    }

    #[test]
    fn json_accepts_array_or_products_object() {
        let array = json!([{ "name": "Tea" }]);
        assert_eq!(rows_from_json(array).unwrap().len(), 1);

        let wrapped = json!({ "products": [{ "name": "Tea" }, { "name": "Milk" }] });
        assert_eq!(rows_from_json(wrapped).unwrap().len(), 2);

        let err = rows_from_json(json!({ "items": [] })).unwrap_err();
        assert!(err.to_string().contains("non-empty \"products\" array"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_rows(Path::new("catalog.xlsx")).unwrap_err();
        assert!(err.to_string().contains("expected a .csv or .json"));
    }

    #[test]
    fn json_file_is_read_from_disk() {
        let path = std::env::temp_dir().join(format!("storefront-import-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"products":[{"name":"Tea","currentPrice":"2.5"}]}"#).unwrap();

        let rows = read_rows(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rows, vec![json!({ "name": "Tea", "currentPrice": "2.5" })]);
    }
}
