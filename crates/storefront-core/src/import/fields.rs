//! Loose value coercion for spreadsheet-shaped import rows.
//!
//! Rows come from CSV exports and hand-written JSON, so a "price" can be a
//! number, `"£1,299.00"`, or an empty cell. These helpers pick a value out of
//! a synonym key list and turn it into text or numbers the same way for every
//! field.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value};

/// One untyped input row: arbitrary column names mapped to JSON values.
pub type ImportRow = Map<String, Value>;

static DECIMAL_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid regex")
});

static INTEGER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+").expect("valid regex"));

static AFFIRMATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(1|true|yes)$").expect("valid regex"));

/// Whether a cell counts as "filled in".
///
/// `null`, `false`, `0`, and `""` are blank. Whitespace-only strings are
/// *not* blank here; callers trim after selection.
pub(crate) fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First value among `keys` that is filled in (see [`is_filled`]).
pub(crate) fn first_filled<'a>(row: &'a ImportRow, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| is_filled(value))
}

/// First value among `keys` that is present and not `null`.
///
/// Unlike [`first_filled`], an explicit `0` or `""` stops the search.
pub(crate) fn first_present<'a>(row: &'a ImportRow, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn number_text(n: &Number) -> String {
    if let Some(f) = n.as_f64() {
        if f.fract() == 0.0 && f.abs() < 1e15 && !n.is_i64() && !n.is_u64() {
            // Whole floats render without a trailing `.0`, matching how
            // spreadsheet tools export them.
            #[allow(clippy::cast_possible_truncation)]
            return (f as i64).to_string();
        }
    }
    n.to_string()
}

/// Renders a cell as text. Arrays join their elements with commas; nested
/// `null`s render as empty strings.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => value_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Trimmed text of the first filled value among `keys`, or an empty string.
pub(crate) fn text_field(row: &ImportRow, keys: &[&str]) -> String {
    first_filled(row, keys)
        .map(|v| value_text(v).trim().to_string())
        .unwrap_or_default()
}

/// Parses the longest leading decimal number of `raw` after leading
/// whitespace, so `"12.5kg"` is `12.5`. Non-finite results are rejected.
pub(crate) fn parse_decimal_prefix(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    DECIMAL_PREFIX_RE
        .find(trimmed)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parses the leading base-10 integer of `raw`; out-of-range values saturate.
pub(crate) fn parse_integer_prefix(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let digits = INTEGER_PREFIX_RE.find(trimmed)?.as_str();
    Some(digits.parse::<i64>().unwrap_or(if digits.starts_with('-') {
        i64::MIN
    } else {
        i64::MAX
    }))
}

/// Parses a money cell, ignoring currency symbols and thousands separators.
pub(crate) fn parse_money(value: &Value) -> Option<f64> {
    let cleaned: String = value_text(value)
        .chars()
        .filter(|c| !matches!(c, '£' | '$' | ','))
        .collect();
    parse_decimal_prefix(&cleaned)
}

/// `true` for `1`, `true`, or `yes` in any letter case.
pub(crate) fn is_affirmative(value: Option<&Value>) -> bool {
    value.is_some_and(|v| AFFIRMATIVE_RE.is_match(value_text(v).trim()))
}

/// Splits an image cell into trimmed, non-empty URLs. `null` array entries
/// are skipped.
pub(crate) fn url_list(value: Option<&Value>) -> Vec<String> {
    let pieces: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(value_text)
            .collect(),
        _ => Vec::new(),
    };
    pieces
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> ImportRow {
        value.as_object().cloned().expect("object row")
    }

    #[test]
    fn first_filled_skips_blank_cells() {
        let r = row(json!({ "a": "", "b": 0, "c": null, "d": "hit" }));
        assert_eq!(first_filled(&r, &["a", "b", "c", "d"]), Some(&json!("hit")));
    }

    #[test]
    fn first_filled_keeps_whitespace_only_strings() {
        let r = row(json!({ "a": "   ", "b": "later" }));
        assert_eq!(first_filled(&r, &["a", "b"]), Some(&json!("   ")));
    }

    #[test]
    fn first_present_stops_at_zero() {
        let r = row(json!({ "a": null, "b": 0, "c": 5 }));
        assert_eq!(first_present(&r, &["a", "b", "c"]), Some(&json!(0)));
    }

    #[test]
    fn value_text_renders_whole_floats_without_fraction() {
        assert_eq!(value_text(&json!(12.0)), "12");
        assert_eq!(value_text(&json!(12.5)), "12.5");
        assert_eq!(value_text(&json!(7)), "7");
    }

    #[test]
    fn value_text_joins_arrays() {
        assert_eq!(value_text(&json!(["a", null, 3])), "a,,3");
    }

    #[test]
    fn parse_decimal_prefix_reads_leading_number() {
        assert_eq!(parse_decimal_prefix("  12.5kg"), Some(12.5));
        assert_eq!(parse_decimal_prefix(".5"), Some(0.5));
        assert_eq!(parse_decimal_prefix("-3"), Some(-3.0));
        assert_eq!(parse_decimal_prefix("1e3"), Some(1000.0));
        assert_eq!(parse_decimal_prefix("abc"), None);
        assert_eq!(parse_decimal_prefix(""), None);
        assert_eq!(parse_decimal_prefix("1e999"), None);
    }

    #[test]
    fn parse_integer_prefix_truncates_decimals() {
        assert_eq!(parse_integer_prefix("12.7"), Some(12));
        assert_eq!(parse_integer_prefix(" 5 units"), Some(5));
        assert_eq!(parse_integer_prefix("-4"), Some(-4));
        assert_eq!(parse_integer_prefix("n/a"), None);
        assert_eq!(
            parse_integer_prefix("99999999999999999999999"),
            Some(i64::MAX)
        );
    }

    #[test]
    fn parse_money_strips_symbols_and_separators() {
        assert_eq!(parse_money(&json!("£1,299.50")), Some(1299.5));
        assert_eq!(parse_money(&json!("$20")), Some(20.0));
        assert_eq!(parse_money(&json!(15)), Some(15.0));
        assert_eq!(parse_money(&json!("free")), None);
        assert_eq!(parse_money(&json!(true)), None);
    }

    #[test]
    fn is_affirmative_matches_yes_true_one() {
        for v in ["Yes", "TRUE", "1", " yes "] {
            assert!(is_affirmative(Some(&json!(v))), "{v} should be affirmative");
        }
        assert!(is_affirmative(Some(&json!(true))));
        assert!(is_affirmative(Some(&json!(1))));
        for v in ["no", "y", "10", ""] {
            assert!(!is_affirmative(Some(&json!(v))), "{v} should not be affirmative");
        }
        assert!(!is_affirmative(None));
    }

    #[test]
    fn url_list_splits_strings_and_arrays() {
        assert_eq!(
            url_list(Some(&json!("a.jpg, b.jpg,, "))),
            vec!["a.jpg".to_string(), "b.jpg".to_string()]
        );
        assert_eq!(
            url_list(Some(&json!([" x.png ", "", "y.png"]))),
            vec!["x.png".to_string(), "y.png".to_string()]
        );
        assert_eq!(
            url_list(Some(&json!([null, "a.jpg"]))),
            vec!["a.jpg".to_string()]
        );
        assert!(url_list(Some(&json!([null]))).is_empty());
        assert!(url_list(Some(&json!(42))).is_empty());
        assert!(url_list(None).is_empty());
    }
}
