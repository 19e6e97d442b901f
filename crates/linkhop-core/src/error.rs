//! Error types for linkhop.
//!
//! [`Error`] is a failure as it is first observed (transport response,
//! schema mismatch, serialization problem). [`UnifiedError`] is the single
//! normalized shape every API call surfaces to callers; an `Error` becomes a
//! `UnifiedError` exactly once, at the dispatcher boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::defaults::VALIDATION_STATUS;
use crate::messages::{DefaultCatalog, MessageCatalog, MessageKey};
use crate::schema::ValidationError;

/// Result type alias using linkhop's raw Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result of an API call: the value or a normalized error.
pub type ApiResult<T> = std::result::Result<T, UnifiedError>;

/// Raw failure before normalization.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed (non-2xx response or connection problem)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload did not match its schema
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Already normalized; passes through normalization untouched
    #[error("{0}")]
    Normalized(#[from] UnifiedError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.into())
    }
}

/// Failure raised by an HTTP transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("Server responded with status {status}")]
    Http { status: u16, body: Option<Value> },

    /// No response was received.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A 2xx response body could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw server payload, when a response was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            TransportError::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            TransportError::Http {
                status: status.as_u16(),
                body: None,
            }
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}

/// Error taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 4xx transport failures other than 422
    Network,
    /// 5xx transport failures
    Server,
    /// Client- or server-detected payload violations (always 422)
    Validation,
    /// Anything not otherwise classifiable
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Server => write!(f, "server"),
            Self::Validation => write!(f, "validation"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Field path to messages, e.g. `"endpoints.0.url" => ["Invalid url"]`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The single normalized error shape.
///
/// Equality compares kind, message, details and status; `cause` is a
/// diagnostic reference only.
#[derive(Debug, Clone)]
pub struct UnifiedError {
    pub kind: ErrorKind,
    pub message: MessageKey,
    pub details: Option<FieldErrors>,
    pub status: Option<u16>,
    cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl UnifiedError {
    pub fn new(kind: ErrorKind, message: MessageKey) -> Self {
        Self {
            kind,
            message,
            details: None,
            status: None,
            cause: None,
        }
    }

    /// Validation failure with field-level details and status 422.
    pub fn validation(details: FieldErrors) -> Self {
        Self::new(ErrorKind::Validation, MessageKey::Validation)
            .with_status(VALIDATION_STATUS)
            .with_details(details)
    }

    pub fn unknown() -> Self {
        Self::new(ErrorKind::Unknown, MessageKey::Unknown)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: FieldErrors) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Underlying error this was classified from.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    /// Messages for one dotted field path.
    pub fn field(&self, path: &str) -> Option<&[String]> {
        self.details
            .as_ref()
            .and_then(|d| d.get(path))
            .map(Vec::as_slice)
    }

    /// Render the wire shape using `catalog` for the message text.
    pub fn to_response(&self, catalog: &dyn MessageCatalog) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind,
            message: catalog.resolve(self.message).into_owned(),
            details: self.details.clone(),
            status: self.status,
        }
    }
}

impl PartialEq for UnifiedError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.details == other.details
            && self.status == other.status
    }
}

impl fmt::Display for UnifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, DefaultCatalog.resolve(self.message))?;
        if let Some(status) = self.status {
            write!(f, " (status {})", status)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnifiedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Wire shape of a normalized error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display_transport() {
        let err = Error::Transport(TransportError::Http {
            status: 404,
            body: None,
        });
        assert_eq!(
            err.to_string(),
            "Transport error: Server responded with status 404"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing base url".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base url");
    }

    #[test]
    fn test_error_display_internal() {
        let err = Error::Internal("unexpected state".to_string());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_transport_error_accessors() {
        let err = TransportError::Http {
            status: 422,
            body: Some(json!({"errors": {}})),
        };
        assert_eq!(err.status(), Some(422));
        assert!(err.body().is_some());

        let err = TransportError::Connection("refused".to_string());
        assert_eq!(err.status(), None);
        assert!(err.body().is_none());
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::Network.to_string(), "network");
        assert_eq!(ErrorKind::Server.to_string(), "server");
        assert_eq!(ErrorKind::Validation.to_string(), "validation");
        assert_eq!(ErrorKind::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_unified_validation_constructor() {
        let err = UnifiedError::validation(FieldErrors::from([(
            "name".to_string(),
            vec!["Required".to_string()],
        )]));
        assert!(err.is_validation());
        assert_eq!(err.status, Some(422));
        assert_eq!(err.field("name"), Some(&["Required".to_string()][..]));
        assert_eq!(err.field("other"), None);
    }

    #[test]
    fn test_unified_equality_ignores_cause() {
        let a = UnifiedError::unknown().with_cause(Error::Internal("boom".to_string()));
        let b = UnifiedError::unknown();
        assert_eq!(a, b);
        assert!(a.cause().is_some());
        assert!(b.cause().is_none());
    }

    #[test]
    fn test_unified_source_is_cause() {
        use std::error::Error as _;
        let err = UnifiedError::unknown().with_cause(Error::Internal("boom".to_string()));
        assert_eq!(err.source().unwrap().to_string(), "Internal error: boom");
    }

    #[test]
    fn test_unified_display() {
        let err = UnifiedError::new(ErrorKind::Network, MessageKey::Unauthorized).with_status(401);
        assert_eq!(
            err.to_string(),
            "network: You need to sign in to continue. (status 401)"
        );
    }

    #[test]
    fn test_wire_shape() {
        let err = UnifiedError::new(ErrorKind::Server, MessageKey::Server).with_status(503);
        let wire = serde_json::to_value(err.to_response(&DefaultCatalog)).unwrap();
        assert_eq!(wire["type"], "server");
        assert_eq!(wire["status"], 503);
        assert!(wire.get("details").is_none());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
        assert_send::<UnifiedError>();
        assert_sync::<UnifiedError>();
    }
}
