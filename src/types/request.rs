//! Inputs supplied by callers
//!
//! Defines the source record (owned by the external source store) and the
//! decrypted credential payload handed to the auth strategies.

use crate::{Error, Result, types::AuthType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Metadata keys read from [`Source::metadata`]
pub mod keys {
    pub const AUTH_TYPE: &str = "authType";
    pub const LOGIN_URL: &str = "loginUrl";
    pub const TOKEN_URL: &str = "tokenUrl";
    pub const API_KEY_HEADER: &str = "apiKeyHeader";
    pub const API_TEST_URL: &str = "apiTestUrl";
    pub const SESSION_CHECK_URL: &str = "sessionCheckUrl";
    pub const USERNAME_FIELD: &str = "usernameField";
    pub const PASSWORD_FIELD: &str = "passwordField";
    pub const ADDITIONAL_FORM_FIELDS: &str = "additionalFormFields";
    pub const AUTH_TEST_URL: &str = "authTestUrl";
    pub const SCOPE: &str = "scope";
}

/// Encrypted credential blob as stored with a source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedCredentials {
    /// Hex-encoded ciphertext
    #[serde(default)]
    pub encrypted_blob: Option<String>,
    /// Hex-encoded initialization vector
    #[serde(default)]
    pub iv: Option<String>,
}

impl EncryptedCredentials {
    /// Create from a blob/IV pair
    pub fn new(encrypted_blob: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            encrypted_blob: Some(encrypted_blob.into()),
            iv: Some(iv.into()),
        }
    }

    /// Blob and IV, only when both are present and non-empty
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.encrypted_blob.as_deref(), self.iv.as_deref()) {
            (Some(blob), Some(iv)) if !blob.is_empty() && !iv.is_empty() => Some((blob, iv)),
            _ => None,
        }
    }
}

/// External content source that may require authentication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Source identifier
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Source category (academic, podcast, ...)
    #[serde(default)]
    pub source_type: String,
    /// Whether fetching from this source needs a session
    #[serde(default)]
    pub requires_authentication: bool,
    /// Stored credentials, if any
    #[serde(default)]
    pub credentials: Option<EncryptedCredentials>,
    /// Free-form protocol configuration
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Source {
    /// Create a new source record
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set source category
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    /// Mark whether authentication is required
    pub fn with_authentication(mut self, required: bool) -> Self {
        self.requires_authentication = required;
        self
    }

    /// Attach stored credentials
    pub fn with_credentials(mut self, credentials: EncryptedCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Stored credentials, treating a half-present pair as absent
    pub fn stored_credentials(&self) -> Option<&EncryptedCredentials> {
        self.credentials.as_ref().filter(|c| c.pair().is_some())
    }

    /// Non-empty metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Resolve the auth protocol from metadata, falling back to the category default
    pub fn auth_type(&self) -> Result<AuthType> {
        match self.meta(keys::AUTH_TYPE) {
            Some(tag) => tag.parse().map_err(|e: crate::types::UnknownAuthType| {
                Error::config(keys::AUTH_TYPE.to_string(), e.to_string())
            }),
            None => Ok(AuthType::default_for_category(&self.source_type)),
        }
    }

    /// Optional URL from metadata; a malformed value counts as missing configuration
    pub fn meta_url(&self, auth_type: AuthType, key: &str) -> Result<Option<Url>> {
        match self.meta(key) {
            Some(raw) => Url::parse(raw)
                .map(Some)
                .map_err(|_| Error::missing_configuration(auth_type, key)),
            None => Ok(None),
        }
    }

    /// Required URL from metadata
    pub fn require_url(&self, auth_type: AuthType, key: &str) -> Result<Url> {
        self.meta_url(auth_type, key)?
            .ok_or_else(|| Error::missing_configuration(auth_type, key))
    }

    /// Extra login form fields, decoded from the JSON map in metadata
    pub fn additional_form_fields(&self, auth_type: AuthType) -> Result<Vec<(String, String)>> {
        let Some(raw) = self.meta(keys::ADDITIONAL_FORM_FIELDS) else {
            return Ok(Vec::new());
        };

        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)
            .map_err(|_| Error::missing_configuration(auth_type, keys::ADDITIONAL_FORM_FIELDS))?;

        let mut fields: Vec<(String, String)> = map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        fields.sort();
        Ok(fields)
    }
}

/// Decrypted credential payload
///
/// Lives only for the duration of a strategy call or inside a session
/// record. `Debug` never prints secret values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry of `access_token`, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

impl Credentials {
    /// Username/password pair
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    /// Static API key
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Client-credentials pair
    pub fn client(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::default()
        }
    }

    /// Pre-obtained access token
    pub fn token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    /// Set refresh token
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set access token expiry
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Set a pre-obtained cookie string
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Every secret value carried, used to assert nothing leaks
    pub fn secrets(&self) -> Vec<&str> {
        [
            &self.password,
            &self.api_key,
            &self.client_secret,
            &self.access_token,
            &self.refresh_token,
            &self.cookie,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.is_empty())
        .collect()
    }
}

/// Non-empty credential field, or a missing-credentials error
pub(crate) fn require_field<'a>(
    value: &'a Option<String>,
    auth_type: AuthType,
    field: &str,
) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::missing_credentials(auth_type, field))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> Option<&'static str> {
            value.as_ref().map(|_| "[REDACTED]")
        }

        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("api_key", &redact(&self.api_key))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .field("cookie", &redact(&self.cookie))
            .finish()
    }
}
