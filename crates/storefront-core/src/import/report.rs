use serde::Serialize;

/// A row that resolved and was persisted. `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedRow {
    pub row: usize,
    pub id: i64,
    pub name: String,
}

/// A row that was skipped, with the reason shown to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRow {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created(CreatedRow),
    Failed(FailedRow),
}

/// Summary of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub created: usize,
    pub failed: usize,
    pub total: usize,
    pub created_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FailedRow>,
    #[serde(skip)]
    pub created_rows: Vec<CreatedRow>,
}

impl ImportReport {
    /// Folds per-row outcomes, kept in input order, into a batch summary.
    #[must_use]
    pub fn from_outcomes(outcomes: Vec<RowOutcome>) -> Self {
        let total = outcomes.len();
        let (created_rows, errors) = outcomes.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut created, mut failed), outcome| {
                match outcome {
                    RowOutcome::Created(row) => created.push(row),
                    RowOutcome::Failed(row) => failed.push(row),
                }
                (created, failed)
            },
        );

        Self {
            created: created_rows.len(),
            failed: errors.len(),
            total,
            created_ids: created_rows.iter().map(|r| r.id).collect(),
            errors,
            created_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(row: usize, id: i64) -> RowOutcome {
        RowOutcome::Created(CreatedRow {
            row,
            id,
            name: format!("Product {row}"),
        })
    }

    fn failed(row: usize) -> RowOutcome {
        RowOutcome::Failed(FailedRow {
            row,
            message: "Product title is required".to_string(),
        })
    }

    #[test]
    fn counts_add_up_to_total() {
        let report = ImportReport::from_outcomes(vec![created(1, 10), failed(2), created(3, 11)]);
        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, 3);
        assert_eq!(report.created_ids, vec![10, 11]);
        assert_eq!(report.errors[0].row, 2);
    }

    #[test]
    fn serializes_camel_case_without_empty_errors() {
        let report = ImportReport::from_outcomes(vec![created(1, 5)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "created": 1, "failed": 0, "total": 1, "createdIds": [5] })
        );
    }

    #[test]
    fn serializes_errors_when_present() {
        let report = ImportReport::from_outcomes(vec![failed(1)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["errors"],
            serde_json::json!([{ "row": 1, "message": "Product title is required" }])
        );
        assert_eq!(json["createdIds"], serde_json::json!([]));
    }
}
