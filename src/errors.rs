//! Error types and handling for the Password Safe SDK
//!
//! Errors fall into two caller-facing families:
//!
//! - **Authentication**: sign-in failed, the host was unreachable while signing
//!   in, or the session token is missing/expired and could not be refreshed.
//! - **API**: the server answered a data call with a non-2xx status. The status
//!   code, a short message and the raw response body are preserved.
//!
//! Transport failures on data calls are reported as [`Error::Network`] or
//! [`Error::Timeout`] and classify as [`ErrorKind::Api`].
//!
//! Lookups never use errors to report absence: a missing system, account or
//! secret comes back as an empty collection or `None`.
//!
//! # Example
//!
//! ```no_run
//! # use password_safe_sdk::{Client, Error};
//! # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
//! match client.get_managed_account_password_by_id("50", None).await {
//!     Ok(password) => println!("checked out under request {}", password.request_id),
//!     Err(Error::Authentication { message, .. }) => println!("sign in again: {}", message),
//!     Err(Error::Api { status: 403, .. }) => println!("not allowed to request this account"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

/// Result type alias for the SDK
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SDK
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication with the Password Safe API failed
    #[error("authentication failed: {message}")]
    Authentication {
        /// What went wrong
        message: String,
        /// HTTP status, when the server answered
        status: Option<u16>,
    },

    /// Non-2xx response from the API
    #[error("api error {status}: {message} (req={request_id:?})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Short description of the failure
        message: String,
        /// Raw response body, if one was returned
        body: Option<String>,
        /// Request ID from x-request-id header
        request_id: Option<String>,
    },

    /// Deserialization error
    #[error("deserialize: {0}")]
    Deserialize(String),

    /// Network error
    #[error("network: {0}")]
    Network(String),

    /// Request timeout
    #[error("timeout")]
    Timeout,

    /// Configuration error
    #[error("config: {0}")]
    Config(String),

    /// A caller-supplied argument was empty or inconsistent
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Other errors
    #[error("other: {0}")]
    Other(String),
}

/// Coarse error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Sign-in or token failures
    Authentication,
    /// Request already exists (409)
    Conflict,
    /// Resource not found (404)
    NotFound,
    /// Any other API or transport failure
    Api,
    /// Response could not be parsed
    Deserialize,
    /// Configuration error
    Config,
    /// Bad caller input
    InvalidArgument,
    /// Other/unknown error
    Other,
}

impl Error {
    /// Get the error kind for categorization
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Api { status: 409, .. } => ErrorKind::Conflict,
            Error::Api { status: 404, .. } => ErrorKind::NotFound,
            Error::Api { .. } | Error::Network(_) | Error::Timeout => ErrorKind::Api,
            Error::Deserialize(_) => ErrorKind::Deserialize,
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    /// Get the HTTP status code if the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Authentication { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this is the "request already exists" conflict
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Whether this is an authentication failure
    pub fn is_authentication(&self) -> bool {
        self.kind() == ErrorKind::Authentication
    }

    /// Get the request ID if available
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Error::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Raw response body of an API error
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::Api { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn authentication(message: impl Into<String>, status: Option<u16>) -> Self {
        Error::Authentication {
            message: message.into(),
            status,
        }
    }

    /// A resource the caller depends on does not exist
    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Error::Api {
            status: 404,
            message: message.into(),
            body: None,
            request_id: None,
        }
    }

    /// Create an API error from a failed response
    ///
    /// The server usually answers with a bare JSON string or plain text; either
    /// becomes the message. Anything longer than a line keeps a generic message
    /// and is only preserved in `body`.
    pub(crate) fn from_response(status: u16, body: String, request_id: Option<String>) -> Self {
        let trimmed = body.trim();
        let message = match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::String(s)) if !s.is_empty() => s,
            Ok(serde_json::Value::Object(map)) => map
                .get("message")
                .or_else(|| map.get("Message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error {}", status)),
            _ if !trimmed.is_empty() && !trimmed.contains('\n') && trimmed.len() <= 200 => {
                trimmed.to_string()
            }
            _ => format!("HTTP error {}", status),
        };

        Error::Api {
            status,
            message,
            body: if body.is_empty() { None } else { Some(body) },
            request_id,
        }
    }

    /// Wrap any failure raised while signing in as an authentication error
    pub(crate) fn into_authentication(self, context: &str) -> Self {
        match self {
            Error::Authentication { .. } => self,
            Error::Api {
                status, message, ..
            } => Error::authentication(format!("{}: {}", context, message), Some(status)),
            other => Error::authentication(format!("{}: {}", context, other), None),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() || err.is_request() {
            Error::Network(err.to_string())
        } else if err.is_decode() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Deserialize(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = Error::from_response(409, String::new(), None);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_conflict());

        let err = Error::from_response(404, String::new(), None);
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(Error::Timeout.kind(), ErrorKind::Api);
        assert_eq!(Error::Network("reset".to_string()).kind(), ErrorKind::Api);
        assert_eq!(
            Error::authentication("bad key", Some(401)).kind(),
            ErrorKind::Authentication
        );
    }

    #[test]
    fn test_from_response_message() {
        let err = Error::from_response(400, "\"Invalid duration\"".to_string(), None);
        match err {
            Error::Api { message, body, .. } => {
                assert_eq!(message, "Invalid duration");
                assert_eq!(body.as_deref(), Some("\"Invalid duration\""));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = Error::from_response(500, String::new(), Some("req-1".to_string()));
        match &err {
            Error::Api { message, body, .. } => {
                assert_eq!(message, "HTTP error 500");
                assert!(body.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.request_id(), Some("req-1"));

        let err = Error::from_response(403, "{\"Message\":\"Forbidden\"}".to_string(), None);
        assert_eq!(err.to_string(), "api error 403: Forbidden (req=None)");
    }

    #[test]
    fn test_error_status_code() {
        let err = Error::authentication("unauthorized", Some(401));
        assert_eq!(err.status_code(), Some(401));

        let err = Error::Timeout;
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_into_authentication() {
        let err = Error::from_response(401, "\"Invalid key\"".to_string(), None)
            .into_authentication("sign-in failed");
        match err {
            Error::Authentication { message, status } => {
                assert_eq!(message, "sign-in failed: Invalid key");
                assert_eq!(status, Some(401));
            }
            other => panic!("unexpected {:?}", other),
        }

        let err = Error::Network("dns".to_string()).into_authentication("sign-in failed");
        assert!(err.is_authentication());
        assert_eq!(err.status_code(), None);
    }
}
