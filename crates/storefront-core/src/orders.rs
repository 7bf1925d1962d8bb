use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pricing::round_cents;
use crate::CoreError;

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether moving an order into this status emails the customer.
    #[must_use]
    pub fn is_notifying(self) -> bool {
        matches!(self, Self::Confirmed | Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::InvalidOrderStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            _ => Err(CoreError::InvalidPaymentStatus(s.to_string())),
        }
    }
}

pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// One requested order line. `price` is the unit price the client saw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub quantity: i32,
    pub price: f64,
}

/// Sum of `price * quantity` over all lines, rounded to cents.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> f64 {
    round_cents(
        lines
            .iter()
            .map(|line| line.price * f64::from(line.quantity))
            .sum(),
    )
}

/// Checks that an order has lines and every line is sane.
///
/// # Errors
///
/// Returns [`CoreError::EmptyOrder`] for no lines and
/// [`CoreError::InvalidOrderLine`] for a non-positive quantity or a negative
/// or non-finite price.
pub fn validate_order_lines(lines: &[OrderLine]) -> Result<(), CoreError> {
    if lines.is_empty() {
        return Err(CoreError::EmptyOrder);
    }
    for line in lines {
        if line.quantity < 1 {
            return Err(CoreError::InvalidOrderLine(format!(
                "quantity for product {} must be at least 1",
                line.product_id
            )));
        }
        if !line.price.is_finite() || line.price < 0.0 {
            return Err(CoreError::InvalidOrderLine(format!(
                "price for product {} must be a non-negative number",
                line.product_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_ignores_case_and_padding() {
        assert_eq!(" Delivered ".parse::<OrderStatus>().unwrap(), OrderStatus::Delivered);
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_terminal_and_confirmed_statuses_notify() {
        assert!(!OrderStatus::Pending.is_notifying());
        assert!(OrderStatus::Confirmed.is_notifying());
        assert!(OrderStatus::Delivered.is_notifying());
        assert!(OrderStatus::Cancelled.is_notifying());
    }

    #[test]
    fn payment_status_round_trips_through_str() {
        for status in [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Failed] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn total_is_rounded_to_cents() {
        let lines = [
            OrderLine {
                product_id: 1,
                quantity: 3,
                price: 1.1,
            },
            OrderLine {
                product_id: 2,
                quantity: 2,
                price: 2.499,
            },
        ];
        assert!((order_total(&lines) - 8.3).abs() < 1e-9);
    }

    #[test]
    fn empty_order_is_rejected() {
        assert!(matches!(validate_order_lines(&[]), Err(CoreError::EmptyOrder)));
        assert_eq!(CoreError::EmptyOrder.to_string(), "No order items");
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let lines = [OrderLine {
            product_id: 4,
            quantity: 0,
            price: 2.0,
        }];
        assert!(matches!(
            validate_order_lines(&lines),
            Err(CoreError::InvalidOrderLine(_))
        ));
    }
}
