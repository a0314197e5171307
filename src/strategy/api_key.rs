//! Static API key sent in a request header

use super::{AuthStrategy, StrategyContext, validate_endpoint};
use crate::{
    Error, Result,
    types::{AuthType, Credentials, SessionData, Source, keys, request::require_field},
};
use reqwest::header::HeaderName;

/// Header used when the source does not name one
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Clone, Copy, Default)]
pub struct ApiKeyStrategy;

#[async_trait::async_trait]
impl AuthStrategy for ApiKeyStrategy {
    fn auth_type(&self) -> AuthType {
        AuthType::ApiKey
    }

    async fn authenticate(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        let api_key = require_field(&credentials.api_key, AuthType::ApiKey, "apiKey")?;

        let header_name = source
            .meta(keys::API_KEY_HEADER)
            .unwrap_or(DEFAULT_API_KEY_HEADER)
            .to_string();
        if HeaderName::from_bytes(header_name.as_bytes()).is_err() {
            return Err(Error::missing_configuration(
                AuthType::ApiKey,
                keys::API_KEY_HEADER,
            ));
        }

        if let Some(url) = source.meta_url(AuthType::ApiKey, keys::API_TEST_URL)? {
            tracing::debug!(source_id = %source.id, header = %header_name, "Validating API key");
            validate_endpoint(ctx, &url, vec![(header_name.clone(), api_key.to_string())]).await?;
        }

        Ok(SessionData::ApiKey {
            api_key: api_key.to_string(),
            header_name,
        })
    }
}
