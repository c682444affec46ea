//! Error handling for the GeneStream Rust client

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Structured error body returned by the GeneStream API on non-2xx responses.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub error: String,
    /// Optional human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} ({})", message, self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// Unified error type for the GeneStream Rust client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// API error with a parsed `{ error, message? }` body
    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: ApiErrorBody },

    /// API error whose body could not be parsed
    #[error("API error ({status}): {message}")]
    UnparsedApi { status: StatusCode, message: String },

    /// Authentication errors raised by the client itself
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Errors while consuming a chunked response stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// The built-in default project cannot be deleted
    #[error("the default project cannot be deleted")]
    DefaultProjectImmutable,

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new stream error
    pub fn stream<T: fmt::Display>(msg: T) -> Self {
        Error::Stream(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// Build an error from a non-2xx response body.
    ///
    /// The API reports failures as `{ "error": "...", "message": "..." }`;
    /// anything that does not parse as that shape is carried verbatim.
    pub(crate) fn from_response(status: StatusCode, body_text: String) -> Self {
        match serde_json::from_str::<ApiErrorBody>(&body_text) {
            Ok(body) => Error::Api { status, body },
            Err(_) => {
                let message = if body_text.trim().is_empty() {
                    status.to_string()
                } else {
                    body_text
                };
                Error::UnparsedApi { status, message }
            }
        }
    }

    /// The HTTP status code carried by this error, when it came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api { status, .. } | Error::UnparsedApi { status, .. } => Some(*status),
            Error::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Whether this error is an authorization failure (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Whether this error is a not-found failure (404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Whether a read may be retried: server errors and transport failures
    /// are transient, every 4xx is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Api { status, .. } | Error::UnparsedApi { status, .. } => {
                status.is_server_error()
            }
            Error::Http(err) => err.status().map_or(true, |s| s.is_server_error()),
            _ => false,
        }
    }
}
