//! Integration tests for `Mailer` and `notify_order_status` using wiremock.

use storefront_core::OrderStatus;
use storefront_notify::{
    notify_order_status, order_status_email, HttpMailer, Mailer, NotifyError, NotifyOutcome,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_mailer(server: &MockServer) -> Mailer {
    let endpoint = format!("{}/send", server.uri());
    let mailer = HttpMailer::with_endpoint(&endpoint, "relay-key", "shop@example.com", 5)
        .expect("mailer construction should not fail");
    Mailer::Http(mailer)
}

#[tokio::test]
async fn send_posts_message_with_bearer_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(header("authorization", "Bearer relay-key"))
        .and(body_partial_json(serde_json::json!({
            "from": "shop@example.com",
            "to": "buyer@example.com",
            "subject": "Order Confirmed (Order #12)",
            "text": "Order Confirmed (Order #12)\n\nYour order has been confirmed."
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let email = order_status_email(OrderStatus::Confirmed, 12, "Shop").expect("notifying status");
    test_mailer(&server)
        .send(" buyer@example.com ", &email)
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn non_success_status_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad sender"))
        .mount(&server)
        .await;

    let email = order_status_email(OrderStatus::Cancelled, 3, "Shop").expect("notifying status");
    let err = test_mailer(&server)
        .send("buyer@example.com", &email)
        .await
        .expect_err("422 should fail");

    match err {
        NotifyError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 422);
            assert_eq!(body, "bad sender");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn blank_recipient_is_rejected_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let email = order_status_email(OrderStatus::Delivered, 1, "Shop").expect("notifying status");
    let err = test_mailer(&server)
        .send("   ", &email)
        .await
        .expect_err("blank recipient should fail");
    assert!(matches!(err, NotifyError::NoRecipient));
}

#[tokio::test]
async fn disabled_mailer_is_not_configured() {
    let email = order_status_email(OrderStatus::Delivered, 1, "Shop").expect("notifying status");
    let err = Mailer::Disabled
        .send("buyer@example.com", &email)
        .await
        .expect_err("disabled mailer should fail");
    assert_eq!(err.to_string(), "Email not configured");
}

#[tokio::test]
async fn delivered_status_sends_exactly_one_email() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "to": "acct@example.com",
            "subject": "Order Delivered (Order #77)"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = notify_order_status(
        &test_mailer(&server),
        "Shop",
        OrderStatus::Delivered,
        77,
        Some(""),
        Some("acct@example.com"),
    )
    .await;

    assert_eq!(
        outcome,
        NotifyOutcome::Sent {
            to: "acct@example.com".to_string()
        }
    );
    assert_eq!(outcome.email_sent(), Some(true));
    assert_eq!(outcome.message_suffix(), " Email sent successfully.");
}

#[tokio::test]
async fn relay_failure_is_reported_not_raised() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = notify_order_status(
        &test_mailer(&server),
        "Shop",
        OrderStatus::Confirmed,
        8,
        Some("buyer@example.com"),
        None,
    )
    .await;

    assert!(matches!(outcome, NotifyOutcome::Failed { .. }));
    assert_eq!(outcome.email_sent(), Some(false));
}
