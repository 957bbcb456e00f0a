use thiserror::Error;

/// Message used when the server gives no usable `error` field.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// All errors that can occur when talking to a yt-dlp-host server.
#[derive(Error, Debug)]
pub enum Error {
    /// The server answered with an unexpected HTTP status, or a task ended in
    /// the `error` state.
    ///
    /// `status_code` is `None` when the failure was reported through a task's
    /// status rather than through the HTTP status line.
    #[error("request error: {message}")]
    Request {
        status_code: Option<u16>,
        message: String,
    },

    /// The client could not be constructed from the supplied settings.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A transport-level HTTP error from reqwest.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response whose body was not the expected JSON.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error, typically from writing a downloaded file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The task completed but the server reported no result file.
    #[error("task {task_id} has no result file")]
    MissingFile { task_id: String },

    /// Polling exceeded an explicitly configured deadline.
    #[error("poll timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    /// Status-line failure with the message pulled from the response body.
    pub(crate) fn from_response(status_code: u16, body: &str) -> Self {
        Error::Request {
            status_code: Some(status_code),
            message: error_message(body),
        }
    }

    /// The server-side message, for [`Error::Request`].
    pub fn message(&self) -> Option<&str> {
        match self {
            Error::Request { message, .. } => Some(message),
            _ => None,
        }
    }

    /// The HTTP status, if this error came from a non-success response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Request { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

/// Pull the `error` string out of a JSON body, falling back to
/// [`UNKNOWN_ERROR`] for missing fields and non-JSON bodies.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

/// A convenience alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
