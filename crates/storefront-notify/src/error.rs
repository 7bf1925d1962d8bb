use thiserror::Error;

/// Errors returned when sending an email.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// No mail relay is configured.
    #[error("Email not configured")]
    NotConfigured,

    #[error("No recipient")]
    NoRecipient,

    /// The relay endpoint in the configuration is not a valid URL.
    #[error("invalid mail relay URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-2xx status.
    #[error("mail relay returned {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}
