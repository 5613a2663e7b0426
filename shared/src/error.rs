//! Error types for the salon webhook functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared library.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// OAuth credential or token problem
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Remote calendar service rejected or failed the call
    #[error("Calendar API error: {0}")]
    Upstream(String),

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of a rejected or failed payment webhook.
///
/// All variants but `Upstream` are client errors (bad payload), `Upstream` is the
/// only server error.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Bad payload: missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Bad payload: fields must be strings or numbers: {}", .0.join(", "))]
    InvalidFields(Vec<&'static str>),

    #[error("Bad payload: paymentStatus must be \"PAID\", received \"{0}\"")]
    UnexpectedStatus(String),

    #[error("Bad payload: unknown stylistId \"{0}\"")]
    UnknownStylist(String),

    #[error("Failed to create calendar event")]
    Upstream(String),
}

impl WebhookError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            WebhookError::Upstream(_) => 500,
            _ => 400,
        }
    }

    /// Whether the caller sent something we cannot accept.
    pub fn is_bad_payload(&self) -> bool {
        self.status_code() == 400
    }
}

impl From<Error> for WebhookError {
    fn from(err: Error) -> Self {
        WebhookError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_status_codes() {
        assert_eq!(WebhookError::MissingFields(vec!["stylistId"]).status_code(), 400);
        assert_eq!(WebhookError::UnexpectedStatus("PENDING".into()).status_code(), 400);
        assert_eq!(WebhookError::UnknownStylist("Ananda".into()).status_code(), 400);
        assert_eq!(WebhookError::InvalidBody("eof".into()).status_code(), 400);
        assert_eq!(WebhookError::InvalidFields(vec!["customerPhone"]).status_code(), 400);
        assert_eq!(WebhookError::Upstream("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_status_message_names_expected_and_received() {
        let message = WebhookError::UnexpectedStatus("PENDING".into()).to_string();
        assert!(message.contains("\"PAID\""));
        assert!(message.contains("PENDING"));
    }

    #[test]
    fn test_library_error_becomes_upstream() {
        let err: WebhookError = Error::Upstream("quota exceeded".into()).into();
        match err {
            WebhookError::Upstream(details) => assert!(details.contains("quota exceeded")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
