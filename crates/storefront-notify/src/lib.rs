//! Customer email notifications for order status changes.

pub mod error;
pub mod mailer;
pub mod notifier;
pub mod template;

pub use error::NotifyError;
pub use mailer::{HttpMailer, Mailer};
pub use notifier::{notify_order_status, resolve_recipient, NotifyOutcome};
pub use template::{escape_html, order_status_email, OrderEmail};
