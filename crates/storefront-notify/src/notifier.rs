//! The order status side effect: pick a recipient, render, send, report.

use storefront_core::OrderStatus;

use crate::mailer::Mailer;
use crate::template::order_status_email;

/// What happened when an order status change was offered to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The status does not email the customer.
    Skipped,
    /// Notifying status but neither the order nor the account has an email.
    NoRecipient,
    Sent { to: String },
    Failed { to: String, reason: String },
}

impl NotifyOutcome {
    /// `Some(sent)` for notifying statuses, `None` otherwise.
    #[must_use]
    pub fn email_sent(&self) -> Option<bool> {
        match self {
            Self::Skipped => None,
            Self::NoRecipient | Self::Failed { .. } => Some(false),
            Self::Sent { .. } => Some(true),
        }
    }

    /// Suffix appended to the update confirmation message.
    #[must_use]
    pub fn message_suffix(&self) -> &'static str {
        match self {
            Self::Sent { .. } => " Email sent successfully.",
            Self::Failed { .. } => " Email could not be sent.",
            Self::Skipped | Self::NoRecipient => "",
        }
    }
}

/// The order's own contact email wins over the account's. Blank values are
/// ignored.
#[must_use]
pub fn resolve_recipient<'a>(
    customer_email: Option<&'a str>,
    account_email: Option<&'a str>,
) -> Option<&'a str> {
    [customer_email, account_email]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|email| !email.is_empty())
}

/// Emails the customer about `status` if it is a notifying status.
///
/// Never fails: send errors are logged and reported in the outcome.
pub async fn notify_order_status(
    mailer: &Mailer,
    store_name: &str,
    status: OrderStatus,
    order_id: i64,
    customer_email: Option<&str>,
    account_email: Option<&str>,
) -> NotifyOutcome {
    let Some(email) = order_status_email(status, order_id, store_name) else {
        return NotifyOutcome::Skipped;
    };
    let Some(to) = resolve_recipient(customer_email, account_email) else {
        tracing::warn!(order_id, %status, "no recipient for order status email");
        return NotifyOutcome::NoRecipient;
    };

    match mailer.send(to, &email).await {
        Ok(()) => {
            tracing::info!(order_id, %status, to, "order status email sent");
            NotifyOutcome::Sent { to: to.to_string() }
        }
        Err(e) => {
            tracing::error!(order_id, %status, to, error = %e, "order status email failed");
            NotifyOutcome::Failed {
                to: to.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
