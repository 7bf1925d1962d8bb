pub mod accounts;
pub mod app_config;
pub mod catalog;
pub mod config;
pub mod coupons;
pub mod import;
pub mod orders;
pub mod pricing;

use thiserror::Error;

pub use accounts::{normalize_email, validate_password, validate_signup, Address, Role};
pub use app_config::{AppConfig, Environment, MailConfig};
pub use catalog::{category_slug, ProductSort, ProductSortKey};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use coupons::{is_expired, normalize_coupon_code, validate_coupon};
pub use orders::{
    order_total, validate_order_lines, OrderLine, OrderStatus, PaymentStatus,
    DEFAULT_PAYMENT_METHOD,
};
pub use pricing::{discount_percent, round_cents, Pricing};

/// Domain rule violations. The message is user-facing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid order status: {0}")]
    InvalidOrderStatus(String),

    #[error("invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid sort: {0}")]
    InvalidSort(String),

    #[error("No order items")]
    EmptyOrder,

    #[error("{0}")]
    InvalidOrderLine(String),

    #[error("{0}")]
    InvalidAccount(String),

    #[error("{0}")]
    InvalidCoupon(String),
}
