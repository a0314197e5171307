//! Error types for the authentication session manager
//!
//! Provides error classification for every layer: configuration, the
//! credential vault, the auth strategies, outbound network calls and
//! the session store.

use thiserror::Error;

use crate::types::AuthType;

/// Main error type for the library
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (settings, master key, injected collaborators)
    #[error("Configuration error in {field}: {message}")]
    Config {
        /// The configuration field that has an error
        field: String,
        /// Error message describing the issue
        message: String,
    },

    /// A source is missing protocol configuration a strategy needs
    #[error("Missing configuration for {auth_type} authentication: {key}")]
    MissingConfiguration {
        /// Strategy that required the value
        auth_type: AuthType,
        /// Metadata key that was absent or malformed
        key: String,
    },

    /// Credentials lack a field a strategy needs
    #[error("Missing credentials for {auth_type} authentication: {field}")]
    MissingCredentials {
        /// Strategy that required the value
        auth_type: AuthType,
        /// Credential field that was absent
        field: String,
    },

    /// No encrypted credentials stored for the source
    #[error("No credentials found for source {source_id}")]
    NoCredentials {
        /// The source without stored credentials
        source_id: String,
    },

    /// Stored credentials could not be decrypted or decoded
    #[error("Failed to decrypt credentials: {reason}")]
    DecryptionFailed {
        /// Why decryption failed (never contains plaintext)
        reason: String,
    },

    /// Upstream rejected the request with a non-success status
    #[error("Authentication endpoint {endpoint} returned status {status}")]
    NonSuccessStatus {
        /// HTTP status code
        status: u16,
        /// The endpoint that rejected the request
        endpoint: String,
    },

    /// Token endpoint reply did not include an access token
    #[error("No access token in response from {endpoint}")]
    NoTokenInResponse {
        /// The token endpoint
        endpoint: String,
    },

    /// Login reply did not set any cookies
    #[error("No cookies received from {endpoint}")]
    NoCookiesReceived {
        /// The login endpoint
        endpoint: String,
    },

    /// Authentication/authorization errors
    #[error("Authentication failed: {reason}")]
    Auth {
        /// The reason why authentication failed
        reason: String,
        /// The endpoint where authentication was attempted
        endpoint: Option<String>,
    },

    /// Network/connection errors
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
        /// The endpoint that could not be reached
        endpoint: Option<String>,
    },

    /// Timeout errors
    #[error("Operation timed out after {duration_secs} seconds: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// Duration in seconds before timing out
        duration_secs: u64,
    },

    /// The source does not require authentication
    #[error("Source {source_id} does not require authentication")]
    AuthenticationNotRequired {
        /// The source id
        source_id: String,
    },

    /// Session does not exist or has expired
    #[error("Session not found or expired: {session_id}")]
    SessionNotFound {
        /// The session id that was looked up
        session_id: String,
    },

    /// Session belongs to another source
    #[error("Session {session_id} belongs to source {expected}, not {actual}")]
    SourceMismatch {
        /// The session id
        session_id: String,
        /// Source the session was created for
        expected: String,
        /// Source supplied by the caller
        actual: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal issue
        message: String,
        /// Additional context about where the error occurred
        context: Option<String>,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error classification used in logs and API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing master key or required metadata
    Configuration,
    /// Missing or undecryptable stored credentials
    Credential,
    /// Rejected credentials, non-success status, missing response field
    Authentication,
    /// Timeout or connection failure
    Network,
    /// Session not found, expired or bound to another source
    Session,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Credential => "credential",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Network => "network",
            ErrorCategory::Session => "session",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure kinds reported by the auth strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureKind {
    MissingCredentials,
    MissingConfiguration,
    NetworkFailure,
    NonSuccessStatus,
    NoTokenInResponse,
    NoCookiesReceived,
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(field: S, message: S) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing configuration error for a strategy
    pub fn missing_configuration(auth_type: AuthType, key: impl Into<String>) -> Self {
        Self::MissingConfiguration {
            auth_type,
            key: key.into(),
        }
    }

    /// Create a missing credentials error for a strategy
    pub fn missing_credentials(auth_type: AuthType, field: impl Into<String>) -> Self {
        Self::MissingCredentials {
            auth_type,
            field: field.into(),
        }
    }

    /// Create a decryption error
    pub fn decryption_failed(reason: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            reason: reason.into(),
        }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(reason: S) -> Self {
        Self::Auth {
            reason: reason.into(),
            endpoint: None,
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            endpoint: None,
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_secs,
        }
    }

    /// Create a session not found error
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. } => true,
            Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::NonSuccessStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get error category for logging/responses
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config { .. } | Error::MissingConfiguration { .. } | Error::Toml(..) => {
                ErrorCategory::Configuration
            }
            Error::MissingCredentials { .. }
            | Error::NoCredentials { .. }
            | Error::DecryptionFailed { .. } => ErrorCategory::Credential,
            Error::NonSuccessStatus { .. }
            | Error::NoTokenInResponse { .. }
            | Error::NoCookiesReceived { .. }
            | Error::Auth { .. } => ErrorCategory::Authentication,
            Error::Network { .. } | Error::Timeout { .. } | Error::Http(..) => {
                ErrorCategory::Network
            }
            Error::AuthenticationNotRequired { .. }
            | Error::SessionNotFound { .. }
            | Error::SourceMismatch { .. } => ErrorCategory::Session,
            Error::Json(..) | Error::Url(..) | Error::Io(..) | Error::Internal { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    /// Strategy-level failure kind, if this error came out of an auth strategy
    pub fn auth_failure(&self) -> Option<AuthFailureKind> {
        match self {
            Error::MissingCredentials { .. } => Some(AuthFailureKind::MissingCredentials),
            Error::MissingConfiguration { .. } => Some(AuthFailureKind::MissingConfiguration),
            Error::Network { .. } | Error::Timeout { .. } | Error::Http(..) => {
                Some(AuthFailureKind::NetworkFailure)
            }
            Error::NonSuccessStatus { .. } => Some(AuthFailureKind::NonSuccessStatus),
            Error::NoTokenInResponse { .. } => Some(AuthFailureKind::NoTokenInResponse),
            Error::NoCookiesReceived { .. } => Some(AuthFailureKind::NoCookiesReceived),
            _ => None,
        }
    }
}
