//! Response type definitions
//!
//! Shapes returned to callers (controllers, the fetch pipeline) by the
//! session manager operations.

use crate::{Error, ErrorCategory, types::AuthType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary returned by session creation and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Session identifier
    pub session_id: String,
    /// Session expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Protocol used
    pub auth_type: AuthType,
}

impl SessionInfo {
    /// Create a new session summary
    pub fn new(session_id: impl Into<String>, expires_at: DateTime<Utc>, auth_type: AuthType) -> Self {
        Self {
            session_id: session_id.into(),
            expires_at,
            auth_type,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

impl From<&crate::types::Session> for SessionInfo {
    fn from(session: &crate::types::Session) -> Self {
        Self::new(
            session.session_id.clone(),
            session.expires_at,
            session.auth_type,
        )
    }
}

/// Tagged outcome of a session operation, suitable for JSON APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// Whether the operation succeeded
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,

    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error category on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

impl SessionResponse {
    /// Successful outcome
    pub fn ok(info: &SessionInfo) -> Self {
        Self {
            success: true,
            session_id: Some(info.session_id.clone()),
            expires_at: Some(info.expires_at),
            auth_type: Some(info.auth_type),
            error: None,
            category: None,
        }
    }

    /// Failed outcome
    pub fn failed(error: &Error) -> Self {
        Self {
            success: false,
            session_id: None,
            expires_at: None,
            auth_type: None,
            error: Some(crate::error::format_error(error)),
            category: Some(error.category()),
        }
    }

    /// Convert an operation result
    pub fn from_result(result: &crate::Result<SessionInfo>) -> Self {
        match result {
            Ok(info) => Self::ok(info),
            Err(e) => Self::failed(e),
        }
    }
}
