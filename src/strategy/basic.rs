//! HTTP basic authentication

use super::{AuthStrategy, StrategyContext, validate_endpoint};
use crate::{
    Result,
    types::{AuthType, Credentials, SessionData, Source, keys, request::require_field},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};

/// Base64 `user:password`, optionally checked against a test URL
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStrategy;

/// Encode a basic auth token
pub fn encode_token(username: &str, password: &str) -> String {
    BASE64_STANDARD.encode(format!("{}:{}", username, password))
}

#[async_trait::async_trait]
impl AuthStrategy for BasicStrategy {
    fn auth_type(&self) -> AuthType {
        AuthType::Basic
    }

    async fn authenticate(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        let username = require_field(&credentials.username, AuthType::Basic, "username")?;
        let password = require_field(&credentials.password, AuthType::Basic, "password")?;
        let token = encode_token(username, password);

        let test_url = match source.meta_url(AuthType::Basic, keys::AUTH_TEST_URL)? {
            Some(url) => Some(url),
            None => source.meta_url(AuthType::Basic, keys::LOGIN_URL)?,
        };

        if let Some(url) = test_url {
            tracing::debug!(source_id = %source.id, "Validating basic credentials");
            validate_endpoint(
                ctx,
                &url,
                vec![("Authorization".to_string(), format!("Basic {}", token))],
            )
            .await?;
        }

        Ok(SessionData::Basic { token })
    }
}
