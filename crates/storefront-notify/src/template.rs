//! Order status email templates.

use std::fmt::Write as _;

use storefront_core::OrderStatus;

/// A rendered email, ready to hand to a [`crate::Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

fn heading_and_message(status: OrderStatus) -> Option<(&'static str, &'static str)> {
    match status {
        OrderStatus::Confirmed => Some(("Order Confirmed", "Your order has been confirmed.")),
        OrderStatus::Delivered => Some((
            "Order Delivered",
            "Your order has been delivered successfully.",
        )),
        OrderStatus::Cancelled => Some(("Order Cancelled", "Your order has been cancelled.")),
        OrderStatus::Pending => None,
    }
}

/// Escapes the five HTML-significant characters.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the customer email for an order entering `status`.
///
/// Returns `None` for statuses that do not notify (`pending`).
#[must_use]
pub fn order_status_email(status: OrderStatus, order_id: i64, store_name: &str) -> Option<OrderEmail> {
    let (heading, message) = heading_and_message(status)?;
    let subject = format!("{heading} (Order #{order_id})");
    let text = format!("{subject}\n\n{message}");

    let store = escape_html(store_name);
    let mut html = String::new();
    html.push_str(
        "<table role=\"presentation\" width=\"100%\" cellpadding=\"0\" cellspacing=\"0\" \
         style=\"max-width:600px;margin:0 auto;font-family:Arial,sans-serif;color:#1f2937;\">",
    );
    let _ = write!(
        html,
        "<tr><td style=\"background:#16a34a;padding:24px;text-align:center;\">\
         <h1 style=\"margin:0;color:#ffffff;font-size:22px;\">{store}</h1>\
         <p style=\"margin:8px 0 0;color:#dcfce7;font-size:16px;\">{}</p></td></tr>",
        escape_html(&subject)
    );
    let _ = write!(
        html,
        "<tr><td style=\"padding:24px;\">\
         <p style=\"margin:0 0 16px;font-size:15px;\">{}</p>\
         <p style=\"margin:0;font-size:13px;color:#6b7280;\">Order reference: #{order_id}</p>\
         </td></tr>",
        escape_html(message)
    );
    let _ = write!(
        html,
        "<tr><td style=\"padding:16px;text-align:center;font-size:12px;color:#9ca3af;\">\
         This is an automated message from {store}.</td></tr>"
    );
    html.push_str("</table>");

    Some(OrderEmail {
        subject,
        html,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_subject_and_text() {
        let email = order_status_email(OrderStatus::Delivered, 42, "Corner Shop").unwrap();
        assert_eq!(email.subject, "Order Delivered (Order #42)");
        assert_eq!(
            email.text,
            "Order Delivered (Order #42)\n\nYour order has been delivered successfully."
        );
        assert!(email.html.contains("Order reference: #42"));
        assert!(email.html.contains("This is an automated message from Corner Shop."));
    }

    #[test]
    fn pending_does_not_render() {
        assert!(order_status_email(OrderStatus::Pending, 1, "Shop").is_none());
    }

    #[test]
    fn store_name_is_escaped_in_html() {
        let email = order_status_email(OrderStatus::Cancelled, 7, "Tom & Jerry's <Deli>").unwrap();
        assert!(email.html.contains("Tom &amp; Jerry&#39;s &lt;Deli&gt;"));
        assert!(!email.html.contains("<Deli>"));
    }

    #[test]
    fn escape_html_leaves_plain_text_alone() {
        assert_eq!(escape_html("Order Confirmed"), "Order Confirmed");
        assert_eq!(escape_html("\"a\""), "&quot;a&quot;");
    }
}
