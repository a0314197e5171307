//! Internal data structures
//!
//! Defines the session record kept by the store and the per-protocol
//! authentication data it carries.

use crate::types::AuthType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default OAuth token type
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Authentication material produced by a strategy
///
/// Each variant is self-sufficient for building request headers.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionData {
    /// Base64 `user:password`
    Basic { token: String },
    /// Bearer access token with optional upstream expiry
    Bearer {
        access_token: String,
        token_type: String,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<String>,
    },
    /// API key and the header it is sent in
    ApiKey { api_key: String, header_name: String },
    /// Joined cookie string
    Cookie { cookie: String },
    /// Pre-obtained OAuth access token
    #[serde(rename = "oauth")]
    OAuth {
        access_token: String,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<String>,
    },
}

impl SessionData {
    /// Protocol this data belongs to
    pub fn auth_type(&self) -> AuthType {
        match self {
            SessionData::Basic { .. } => AuthType::Basic,
            SessionData::Bearer { .. } => AuthType::Bearer,
            SessionData::ApiKey { .. } => AuthType::ApiKey,
            SessionData::Cookie { .. } => AuthType::Cookie,
            SessionData::OAuth { .. } => AuthType::OAuth,
        }
    }

    /// Upstream token expiry, if the protocol tracks one
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionData::Bearer { expires_at, .. } | SessionData::OAuth { expires_at, .. } => {
                *expires_at
            }
            _ => None,
        }
    }

    /// Whether the upstream token has expired; tokens without expiry never do
    pub fn is_token_expired(&self) -> bool {
        self.token_expires_at()
            .map(|expires_at| Utc::now() >= expires_at)
            .unwrap_or(false)
    }

    /// Refresh token carried by the data
    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            SessionData::Bearer { refresh_token, .. } | SessionData::OAuth { refresh_token, .. } => {
                refresh_token.as_deref()
            }
            _ => None,
        }
    }

    /// Merge a refresh result into the current data
    ///
    /// A token reply without a refresh token keeps the previous one.
    pub fn merge(self, update: SessionData) -> SessionData {
        let previous_refresh = self.refresh_token().map(str::to_string);
        match update {
            SessionData::Bearer {
                access_token,
                token_type,
                expires_at,
                refresh_token,
            } => SessionData::Bearer {
                access_token,
                token_type,
                expires_at,
                refresh_token: refresh_token.or(previous_refresh),
            },
            SessionData::OAuth {
                access_token,
                expires_at,
                refresh_token,
            } => SessionData::OAuth {
                access_token,
                expires_at,
                refresh_token: refresh_token.or(previous_refresh),
            },
            other => other,
        }
    }
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionData::Basic { .. } => f.debug_struct("Basic").finish_non_exhaustive(),
            SessionData::Bearer {
                token_type,
                expires_at,
                refresh_token,
                ..
            } => f
                .debug_struct("Bearer")
                .field("token_type", token_type)
                .field("expires_at", expires_at)
                .field("has_refresh_token", &refresh_token.is_some())
                .finish_non_exhaustive(),
            SessionData::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .finish_non_exhaustive(),
            SessionData::Cookie { .. } => f.debug_struct("Cookie").finish_non_exhaustive(),
            SessionData::OAuth {
                expires_at,
                refresh_token,
                ..
            } => f
                .debug_struct("OAuth")
                .field("expires_at", expires_at)
                .field("has_refresh_token", &refresh_token.is_some())
                .finish_non_exhaustive(),
        }
    }
}

/// In-memory session record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unguessable session identifier
    pub session_id: String,
    /// Source the session authenticates against
    pub source_id: String,
    /// Protocol used
    pub auth_type: AuthType,
    /// Authentication material
    pub data: SessionData,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiration timestamp of the session wrapper
    pub expires_at: DateTime<Utc>,
    /// Last successful refresh
    #[serde(default)]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session record
    pub fn new(
        session_id: impl Into<String>,
        source_id: impl Into<String>,
        data: SessionData,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            source_id: source_id.into(),
            auth_type: data.auth_type(),
            data,
            created_at: Utc::now(),
            expires_at,
            refreshed_at: None,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check expiry against a fixed instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Get time remaining until expiration
    pub fn time_until_expiry(&self) -> chrono::Duration {
        self.expires_at - Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bearer(refresh: Option<&str>) -> SessionData {
        SessionData::Bearer {
            access_token: "old".to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: Some(Utc::now() - Duration::seconds(5)),
            refresh_token: refresh.map(str::to_string),
        }
    }

    #[test]
    fn test_merge_keeps_previous_refresh_token() {
        let update = SessionData::Bearer {
            access_token: "new".to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            refresh_token: None,
        };
        let merged = bearer(Some("r1")).merge(update);
        assert_eq!(merged.refresh_token(), Some("r1"));
        assert!(!merged.is_token_expired());
    }

    #[test]
    fn test_merge_prefers_new_refresh_token() {
        let update = SessionData::OAuth {
            access_token: "new".to_string(),
            expires_at: None,
            refresh_token: Some("r2".to_string()),
        };
        let merged = bearer(Some("r1")).merge(update);
        assert_eq!(merged.refresh_token(), Some("r2"));
        assert_eq!(merged.auth_type(), AuthType::OAuth);
    }

    #[test]
    fn test_token_expiry() {
        assert!(bearer(None).is_token_expired());
        let basic = SessionData::Basic {
            token: "dTpw".to_string(),
        };
        assert!(!basic.is_token_expired());
        assert!(basic.token_expires_at().is_none());
    }

    #[test]
    fn test_session_expiry() {
        let data = SessionData::Cookie {
            cookie: "a=1".to_string(),
        };
        let session = Session::new("id", "src", data, Utc::now() + Duration::minutes(5));
        assert_eq!(session.auth_type, AuthType::Cookie);
        assert!(!session.is_expired());
        assert!(session.is_expired_at(Utc::now() + Duration::minutes(6)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let data = SessionData::ApiKey {
            api_key: "k-123".to_string(),
            header_name: "X-API-Key".to_string(),
        };
        let debug = format!("{:?}", data);
        assert!(debug.contains("X-API-Key"));
        assert!(!debug.contains("k-123"));
    }

    #[test]
    fn test_serde_tag() {
        let data = SessionData::Cookie {
            cookie: "a=1".to_string(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "cookie");
    }
}
