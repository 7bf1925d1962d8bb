use chrono::{DateTime, Utc};

use crate::CoreError;

/// Coupon codes are stored trimmed and upper-cased.
#[must_use]
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Validates a new coupon and returns its normalized code.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCoupon`] for a blank code or a discount
/// outside `1..=100`.
pub fn validate_coupon(code: &str, discount: i32) -> Result<String, CoreError> {
    let code = normalize_coupon_code(code);
    if code.is_empty() {
        return Err(CoreError::InvalidCoupon(
            "Please provide a coupon code".to_string(),
        ));
    }
    if !(1..=100).contains(&discount) {
        return Err(CoreError::InvalidCoupon(
            "Discount must be between 1 and 100".to_string(),
        ));
    }
    Ok(code)
}

/// A coupon is expired once `now` is strictly past its expiry date.
#[must_use]
pub fn is_expired(expiry_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expiry_date
}
