//! Token endpoint exchanges
//!
//! Client-credentials and refresh-token grants share one request/response
//! shape; bearer and oauth strategies both go through here.

use super::StrategyContext;
use crate::{
    Error, Result,
    session::network::{HttpRequest, redact_url},
    types::{DEFAULT_TOKEN_TYPE, SessionData},
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use url::Url;

/// Token lifetime assumed when the reply carries no `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token issued by an endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: Option<String>,
}

impl TokenGrant {
    /// Bearer session data
    pub fn into_bearer(self) -> SessionData {
        SessionData::Bearer {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_at: Some(self.expires_at),
            refresh_token: self.refresh_token,
        }
    }

    /// OAuth session data
    pub fn into_oauth(self) -> SessionData {
        SessionData::OAuth {
            access_token: self.access_token,
            expires_at: Some(self.expires_at),
            refresh_token: self.refresh_token,
        }
    }
}

impl std::fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGrant")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

// Some providers send expires_in as a string.
fn expires_in_secs(value: Option<&serde_json::Value>) -> i64 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_u64().map(|_| i64::MAX)),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    parsed
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
}

/// Expiry instant `secs` from now, saturating at the maximum timestamp
fn expiry_after(secs: i64) -> DateTime<Utc> {
    Duration::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// POST a grant form to a token endpoint
pub async fn request_token(
    ctx: &StrategyContext,
    token_url: &Url,
    form: Vec<(String, String)>,
) -> Result<TokenGrant> {
    let endpoint = redact_url(token_url.as_str());
    let request =
        HttpRequest::post_form(token_url.as_str(), form).with_header("Accept", "application/json");

    let response = ctx.send(request).await?;
    if !response.is_success() {
        return Err(Error::NonSuccessStatus {
            status: response.status,
            endpoint,
        });
    }

    let reply: TokenResponse = response.json().map_err(|_| Error::NoTokenInResponse {
        endpoint: endpoint.clone(),
    })?;

    let access_token = reply
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or(Error::NoTokenInResponse { endpoint })?;

    let expires_at = expiry_after(expires_in_secs(reply.expires_in.as_ref()));

    Ok(TokenGrant {
        access_token,
        token_type: reply
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
        expires_at,
        refresh_token: reply.refresh_token.filter(|t| !t.is_empty()),
    })
}

/// Client-credentials grant
pub async fn client_credentials(
    ctx: &StrategyContext,
    token_url: &Url,
    client_id: &str,
    client_secret: &str,
    scope: Option<&str>,
) -> Result<TokenGrant> {
    let mut form = vec![
        ("grant_type".to_string(), "client_credentials".to_string()),
        ("client_id".to_string(), client_id.to_string()),
        ("client_secret".to_string(), client_secret.to_string()),
    ];
    if let Some(scope) = scope {
        form.push(("scope".to_string(), scope.to_string()));
    }
    request_token(ctx, token_url, form).await
}

/// Refresh-token grant
pub async fn refresh_token(
    ctx: &StrategyContext,
    token_url: &Url,
    refresh_token: &str,
) -> Result<TokenGrant> {
    let form = vec![
        ("grant_type".to_string(), "refresh_token".to_string()),
        ("refresh_token".to_string(), refresh_token.to_string()),
    ];
    request_token(ctx, token_url, form).await
}
