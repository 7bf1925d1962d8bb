use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use storefront_core::MailConfig;

use crate::error::NotifyError;
use crate::template::OrderEmail;

const USER_AGENT: &str = concat!("storefront/", env!("CARGO_PKG_VERSION"));

/// Body posted to the mail relay.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Sends mail through an HTTP relay that accepts a JSON message and a bearer
/// API key.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    /// Creates a mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidUrl`] if `api_url` is not an `http(s)`
    /// URL, or [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        Self::with_endpoint(
            &config.api_url,
            &config.api_key,
            &config.from_address,
            config.timeout_secs,
        )
    }

    /// Creates a mailer posting to `endpoint`. Used by tests to point at a
    /// mock relay.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::InvalidUrl`] if `endpoint` is not an `http(s)`
    /// URL, or [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn with_endpoint(
        endpoint: &str,
        api_key: &str,
        from: &str,
        timeout_secs: u64,
    ) -> Result<Self, NotifyError> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(NotifyError::InvalidUrl {
                url: endpoint.to_string(),
                reason: "expected an http or https URL".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }

    async fn send(&self, to: &str, email: &OrderEmail) -> Result<(), NotifyError> {
        let body = SendRequest {
            from: &self.from,
            to,
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(unexpected_status(status, body))
    }
}

fn unexpected_status(status: StatusCode, mut body: String) -> NotifyError {
    const MAX_BODY: usize = 512;
    if body.len() > MAX_BODY {
        let mut cut = MAX_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    NotifyError::UnexpectedStatus {
        status: status.as_u16(),
        body,
    }
}

/// Outbound mail transport.
#[derive(Debug, Clone)]
pub enum Mailer {
    Http(HttpMailer),
    /// No relay configured; every send fails with [`NotifyError::NotConfigured`].
    Disabled,
}

impl Mailer {
    /// Builds an HTTP mailer when mail is configured, else [`Mailer::Disabled`].
    ///
    /// # Errors
    ///
    /// Propagates [`HttpMailer::new`] failures.
    pub fn from_config(config: Option<&MailConfig>) -> Result<Self, NotifyError> {
        match config {
            Some(config) => Ok(Self::Http(HttpMailer::new(config)?)),
            None => Ok(Self::Disabled),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Delivers `email` to `to`.
    ///
    /// # Errors
    ///
    /// - [`NotifyError::NotConfigured`] when the mailer is disabled.
    /// - [`NotifyError::NoRecipient`] when `to` is blank.
    /// - [`NotifyError::Http`] on transport failure.
    /// - [`NotifyError::UnexpectedStatus`] when the relay answers non-2xx.
    pub async fn send(&self, to: &str, email: &OrderEmail) -> Result<(), NotifyError> {
        let Self::Http(mailer) = self else {
            return Err(NotifyError::NotConfigured);
        };
        let to = to.trim();
        if to.is_empty() {
            return Err(NotifyError::NoRecipient);
        }
        mailer.send(to, email).await
    }
}
