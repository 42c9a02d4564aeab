//! Error types for the kardex CLI.
//!
//! Every failure carries an [`ErrorCode`] so operators can reference a
//! stable identifier when reporting problems, independent of the
//! human-readable message.

use std::fmt;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, KardexError>;

/// Stable error codes, grouped by area:
/// - K1XX authentication and session
/// - K2XX network and API
/// - K3XX file and I/O
/// - K4XX configuration
/// - K5XX validation and input
/// - K9XX internal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (K1XX)
    AuthenticationFailed,
    SessionExpired,
    InvalidCredentials,
    MalformedToken,

    // Network (K2XX)
    HttpError,
    ConnectionTimeout,
    ConnectionRefused,
    ApiError,
    InvalidResponse,

    // File/IO (K3XX)
    FileNotFound,
    FileReadError,
    FileWriteError,

    // Configuration (K4XX)
    ConfigError,
    InvalidEndpoint,

    // Validation (K5XX)
    InvalidInput,
    ValidationFailed,

    // Internal (K9XX)
    InternalError,
    SerializationError,
}

impl ErrorCode {
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::SessionExpired => 102,
            ErrorCode::InvalidCredentials => 103,
            ErrorCode::MalformedToken => 104,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 203,
            ErrorCode::ApiError => 204,
            ErrorCode::InvalidResponse => 205,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K{}", self.code())
    }
}

/// Main error type for all kardex operations.
#[derive(Error, Debug)]
pub enum KardexError {
    /// Authentication or session failure. Covers login rejection,
    /// terminal refresh failure and malformed stored tokens.
    #[error("[{code}] Authentication error: {message}")]
    Auth {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure with no server response available.
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The server answered with a non-success status.
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    /// File or I/O failure with context.
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    #[error("[{code}] Validation error: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        field: Option<String>,
    },

    #[error("[{code}] Internal error: {message}")]
    Internal { code: ErrorCode, message: String },

    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

impl KardexError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::InvalidCredentials,
            message: message.into(),
            source: None,
        }
    }

    /// Terminal session failure: refresh rejected or no refresh token
    /// on hand. By the time this is constructed the token store has
    /// already been cleared.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::SessionExpired,
            message: message.into(),
            source: None,
        }
    }

    pub fn session_expired_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Auth {
            code: ErrorCode::SessionExpired,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn malformed_token(message: impl Into<String>) -> Self {
        Self::Auth {
            code: ErrorCode::MalformedToken,
            message: message.into(),
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            code: ErrorCode::HttpError,
            message: message.into(),
            source: None,
        }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status: 0,
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::FileWriteError,
            _ => ErrorCode::FileReadError,
        };
        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    pub fn file_write(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            code: ErrorCode::FileWriteError,
            context: context.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    /// Error code attached to this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            KardexError::Auth { code, .. }
            | KardexError::Network { code, .. }
            | KardexError::Api { code, .. }
            | KardexError::Io { code, .. }
            | KardexError::Config { code, .. }
            | KardexError::InvalidInput { code, .. }
            | KardexError::Validation { code, .. }
            | KardexError::Internal { code, .. }
            | KardexError::Serialization { code, .. } => *code,
        }
    }

    /// HTTP status, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            KardexError::Api { status, .. } if *status != 0 => Some(*status),
            _ => None,
        }
    }

    /// Transport error with no status available. These never trigger a
    /// token refresh.
    pub fn is_network(&self) -> bool {
        matches!(self, KardexError::Network { .. })
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            KardexError::Auth {
                code: ErrorCode::SessionExpired,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for KardexError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };
        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<std::io::Error> for KardexError {
    fn from(err: std::io::Error) -> Self {
        Self::io("I/O error", err)
    }
}

impl From<serde_json::Error> for KardexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for KardexError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<csv::Error> for KardexError {
    fn from(err: csv::Error) -> Self {
        Self::file_write("CSV export", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod unit {
        use super::*;

        #[test]
        fn codes_are_stable() {
            assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
            assert_eq!(ErrorCode::SessionExpired.code(), 102);
            assert_eq!(ErrorCode::ApiError.code(), 204);
            assert_eq!(ErrorCode::ConfigError.code(), 401);
        }

        #[test]
        fn display_includes_code() {
            let err = KardexError::api(404, "empleado not found");
            let rendered = err.to_string();
            assert!(rendered.contains("K204"));
            assert!(rendered.contains("404"));
        }

        #[test]
        fn session_expired_is_detectable() {
            assert!(KardexError::session_expired("refresh rejected").is_session_expired());
            assert!(!KardexError::api(401, "nope").is_session_expired());
        }

        #[test]
        fn api_status_exposed() {
            assert_eq!(KardexError::api(403, "forbidden").status(), Some(403));
            assert_eq!(KardexError::invalid_response("garbage").status(), None);
            assert_eq!(KardexError::network("down").status(), None);
        }

        #[test]
        fn io_not_found_maps_code() {
            let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
            let mapped = KardexError::io("reading tokens", err);
            assert_eq!(mapped.error_code(), ErrorCode::FileNotFound);
        }
    }
}
