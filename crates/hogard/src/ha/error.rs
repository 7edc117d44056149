use std::time::Duration;

/// Failure talking to Home Assistant.
///
/// The display text is shown to the end user, so it carries whatever detail
/// Home Assistant returned.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Error 401: access token rejected by Home Assistant")]
    Unauthorized,

    #[error("Error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid request payload: {0}")]
    Payload(#[from] serde_json::Error),
}
