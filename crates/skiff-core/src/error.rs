//! Error types for Skiff

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Transport Errors
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    // Service Errors
    #[error("{0}")]
    Protocol(ResponseError),

    #[error("The specified key does not exist: {key}: {source}")]
    KeyNotFound {
        key: String,
        #[source]
        source: ResponseError,
    },

    // Parse Errors
    #[error("Malformed listing: {0}")]
    MalformedListing(String),

    // Validation Errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Transport { timed_out: true, .. } => "RequestTimeout",
            Error::Transport { .. } => "TransportError",
            Error::Protocol(_) => "S3Error",
            Error::KeyNotFound { .. } => "NoSuchKey",
            Error::MalformedListing(_) => "MalformedListing",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::Config(_) => "InvalidConfiguration",
        }
    }

    /// HTTP status of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol(e) | Error::KeyNotFound { source: e, .. } => Some(e.status),
            _ => None,
        }
    }

    /// The service reply behind this error, if any.
    pub fn response(&self) -> Option<&ResponseError> {
        match self {
            Error::Protocol(e) | Error::KeyNotFound { source: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// Network-level failures are the only ones a retry can fix.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

/// Detail of a non-2xx reply from the storage service.
#[derive(Debug, Clone)]
pub struct ResponseError {
    pub status: u16,
    pub reason: Option<String>,
    /// Service error code from `<Code>`, e.g. `NoSuchKey`
    pub code: Option<String>,
    /// Text of `<Message>`, or `"HTTP error"` when the body carries none
    pub message: String,
    pub key: Option<String>,
    pub body: Bytes,
}

impl ResponseError {
    pub const DEFAULT_MESSAGE: &'static str = "HTTP error";

    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            reason: None,
            code: None,
            message: Self::DEFAULT_MESSAGE.to_string(),
            key: None,
            body,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Raw body as text, lossily decoded.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (status={}", self.message, self.status)?;
        if let Some(ref reason) = self.reason {
            write!(f, ", reason={}", reason)?;
        }
        if let Some(ref code) = self.code {
            write!(f, ", code={}", code)?;
        }
        if let Some(ref key) = self.key {
            write!(f, ", key={:?}", key)?;
        }
        write!(f, ")")
    }
}

impl std::error::Error for ResponseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_display() {
        let err = ResponseError::new(404, Bytes::new())
            .with_reason("Not Found")
            .with_message("The specified key does not exist.")
            .with_key("photos/cat.jpg");

        assert_eq!(
            err.to_string(),
            "The specified key does not exist. (status=404, reason=Not Found, key=\"photos/cat.jpg\")"
        );
    }

    #[test]
    fn test_error_classification() {
        let not_found = Error::KeyNotFound {
            key: "a".into(),
            source: ResponseError::new(404, Bytes::new()),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_transient());
        assert_eq!(not_found.status(), Some(404));
        assert_eq!(not_found.code(), "NoSuchKey");

        let timeout = Error::timeout("deadline elapsed");
        assert!(timeout.is_transient());
        assert_eq!(timeout.status(), None);
        assert_eq!(timeout.code(), "RequestTimeout");

        let protocol = Error::Protocol(ResponseError::new(500, Bytes::from_static(b"oops")));
        assert!(!protocol.is_transient());
        assert_eq!(protocol.response().map(|r| r.body_text()), Some("oops".into()));
    }
}
