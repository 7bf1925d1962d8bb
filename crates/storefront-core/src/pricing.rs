//! Price and discount derivation shared by the importer and the product
//! write handlers.

use serde::{Deserialize, Serialize};

/// The three stored prices plus the derived discount percentage.
///
/// `price` always mirrors `current_price`; it exists because storefront
/// clients sort and filter on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub price: f64,
    pub previous_price: f64,
    pub current_price: f64,
    pub discount: i16,
}

/// Percentage saved going from `previous` to `current`, rounded and clamped
/// to `0..=100`. Zero when there is no positive previous price.
#[must_use]
pub fn discount_percent(previous: f64, current: f64) -> i16 {
    if previous.is_nan() || previous <= 0.0 || !current.is_finite() {
        return 0;
    }
    let pct = ((1.0 - current / previous) * 100.0).round();
    if pct.is_nan() {
        return 0;
    }
    // Clamped into 0..=100 so the narrowing cast is lossless.
    #[allow(clippy::cast_possible_truncation)]
    let clamped = pct.clamp(0.0, 100.0) as i16;
    clamped
}

/// Rounds a monetary amount to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn non_zero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

impl Pricing {
    /// Builds pricing from an already-resolved previous/current pair.
    ///
    /// Both prices are rounded to cents before the discount is derived, so
    /// the discount always matches the stored amounts.
    #[must_use]
    pub fn from_pair(previous_price: f64, current_price: f64) -> Self {
        let previous_price = previous_price.max(0.0);
        let current_price = if current_price > 0.0 {
            current_price
        } else {
            previous_price
        };
        let previous_price = round_cents(previous_price);
        let current_price = round_cents(current_price);
        Self {
            price: current_price,
            previous_price,
            current_price,
            discount: discount_percent(previous_price, current_price),
        }
    }

    /// Pricing for a newly created product.
    ///
    /// A bare `price` seeds whichever of previous/current is missing, so a
    /// request carrying only `price` yields an undiscounted product.
    #[must_use]
    pub fn for_create(price: Option<f64>, previous: Option<f64>, current: Option<f64>) -> Self {
        let base = non_zero(price).unwrap_or(0.0).max(0.0);
        let previous = non_zero(previous).unwrap_or(base).max(0.0);
        let current = non_zero(current).unwrap_or(base).max(0.0);
        Self::from_pair(previous, current)
    }

    /// Applies a sparse price update on top of stored pricing.
    ///
    /// Returns `self` untouched when no price field is present. A bare `price`
    /// replaces the current price and keeps the stored previous price.
    #[must_use]
    pub fn apply_update(
        self,
        price: Option<f64>,
        previous: Option<f64>,
        current: Option<f64>,
    ) -> Self {
        if price.is_none() && previous.is_none() && current.is_none() {
            return self;
        }
        let previous = previous.map_or(self.previous_price, |v| v.max(0.0));
        let current = current
            .or(price)
            .map_or(self.current_price, |v| v.max(0.0));
        Self::from_pair(previous, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_from_hundred_to_eighty_is_twenty() {
        assert_eq!(discount_percent(100.0, 80.0), 20);
    }

    #[test]
    fn discount_is_zero_without_previous_price() {
        assert_eq!(discount_percent(0.0, 80.0), 0);
        assert_eq!(discount_percent(-5.0, 1.0), 0);
        assert_eq!(discount_percent(f64::NAN, 1.0), 0);
    }

    #[test]
    fn discount_is_clamped_to_bounds() {
        assert_eq!(discount_percent(10.0, 25.0), 0);
        assert_eq!(discount_percent(10.0, -25.0), 100);
        assert_eq!(discount_percent(10.0, f64::INFINITY), 0);
    }

    #[test]
    fn discount_rounds_to_nearest_integer() {
        assert_eq!(discount_percent(3.0, 2.0), 33);
        assert_eq!(discount_percent(200.0, 199.0), 1);
        assert_eq!(discount_percent(200.0, 199.5), 0);
    }

    #[test]
    fn round_cents_rounds_half_up() {
        assert!((round_cents(10.005_1) - 10.01).abs() < f64::EPSILON);
        assert!((round_cents(3.0 * 1.1) - 3.3).abs() < f64::EPSILON);
    }

    #[test]
    fn from_pair_discounts_the_rounded_prices() {
        let pricing = Pricing::from_pair(0.001, 0.0001);
        assert!(pricing.previous_price.abs() < f64::EPSILON);
        assert!(pricing.current_price.abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 0);

        let pricing = Pricing::from_pair(10.004, 7.996);
        assert!((pricing.previous_price - 10.0).abs() < f64::EPSILON);
        assert!((pricing.current_price - 8.0).abs() < f64::EPSILON);
        assert!((pricing.price - 8.0).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 20);
    }

    #[test]
    fn from_pair_falls_back_to_previous_when_current_missing() {
        let pricing = Pricing::from_pair(12.5, 0.0);
        assert!((pricing.current_price - 12.5).abs() < f64::EPSILON);
        assert!((pricing.price - 12.5).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 0);
    }

    #[test]
    fn for_create_with_only_price_is_undiscounted() {
        let pricing = Pricing::for_create(Some(9.99), None, None);
        assert!((pricing.previous_price - 9.99).abs() < f64::EPSILON);
        assert!((pricing.current_price - 9.99).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 0);
    }

    #[test]
    fn for_create_with_sale_price_derives_discount() {
        let pricing = Pricing::for_create(None, Some(50.0), Some(40.0));
        assert!((pricing.price - 40.0).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 20);
    }

    #[test]
    fn for_create_negative_previous_is_floored() {
        let pricing = Pricing::for_create(Some(5.0), Some(-3.0), None);
        assert!(pricing.previous_price.abs() < f64::EPSILON);
        assert!((pricing.current_price - 5.0).abs() < f64::EPSILON);
        assert_eq!(pricing.discount, 0);
    }

    #[test]
    fn apply_update_without_price_fields_is_noop() {
        let stored = Pricing::from_pair(100.0, 80.0);
        assert_eq!(stored.apply_update(None, None, None), stored);
    }

    #[test]
    fn apply_update_current_price_recomputes_discount() {
        let stored = Pricing::from_pair(100.0, 80.0);
        let updated = stored.apply_update(None, None, Some(50.0));
        assert!((updated.current_price - 50.0).abs() < f64::EPSILON);
        assert!((updated.previous_price - 100.0).abs() < f64::EPSILON);
        assert_eq!(updated.discount, 50);
    }

    #[test]
    fn apply_update_bare_price_replaces_current() {
        let stored = Pricing::from_pair(100.0, 100.0);
        let updated = stored.apply_update(Some(75.0), None, None);
        assert!((updated.price - 75.0).abs() < f64::EPSILON);
        assert_eq!(updated.discount, 25);
    }
}
