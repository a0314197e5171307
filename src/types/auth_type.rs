//! Supported authentication protocols

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Authentication protocol used for a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// HTTP basic authentication
    Basic,
    /// Bearer token, optionally obtained via client-credentials grant
    Bearer,
    /// Static API key sent in a header
    ApiKey,
    /// Form login producing a cookie session
    Cookie,
    /// Pre-obtained OAuth access token
    #[serde(rename = "oauth")]
    OAuth,
}

impl AuthType {
    /// Every supported protocol
    pub const ALL: [AuthType; 5] = [
        AuthType::Basic,
        AuthType::Bearer,
        AuthType::ApiKey,
        AuthType::Cookie,
        AuthType::OAuth,
    ];

    /// Tag as it appears in source metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Basic => "basic",
            AuthType::Bearer => "bearer",
            AuthType::ApiKey => "api_key",
            AuthType::Cookie => "cookie",
            AuthType::OAuth => "oauth",
        }
    }

    /// Fallback protocol for a source category when metadata names none
    pub fn default_for_category(source_type: &str) -> Self {
        match source_type.to_ascii_lowercase().as_str() {
            "academic" => AuthType::Cookie,
            "podcast" => AuthType::ApiKey,
            _ => AuthType::Basic,
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a metadata tag names no known protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAuthType(pub String);

impl fmt::Display for UnknownAuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown auth type '{}'", self.0)
    }
}

impl std::error::Error for UnknownAuthType {}

impl FromStr for AuthType {
    type Err = UnknownAuthType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "bearer" => Ok(AuthType::Bearer),
            "api_key" | "apikey" | "api-key" => Ok(AuthType::ApiKey),
            "cookie" => Ok(AuthType::Cookie),
            "oauth" | "oauth2" => Ok(AuthType::OAuth),
            _ => Err(UnknownAuthType(s.to_string())),
        }
    }
}
