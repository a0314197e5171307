//! Bearer tokens from a client-credentials grant

use super::{AuthStrategy, StrategyContext, reauthenticate, token};
use crate::{
    Result,
    types::{
        AuthType, Credentials, DEFAULT_TOKEN_TYPE, Session, SessionData, Source, keys,
        request::require_field,
    },
};
use chrono::Utc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct BearerStrategy;

impl BearerStrategy {
    /// Supplied access token that is still valid, as session data
    fn reusable_token(credentials: &Credentials) -> Option<SessionData> {
        let access_token = credentials.access_token.as_deref().filter(|t| !t.is_empty())?;
        if let Some(expires_at) = credentials.expires_at
            && Utc::now() >= expires_at
        {
            return None;
        }

        Some(SessionData::Bearer {
            access_token: access_token.to_string(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: credentials.expires_at,
            refresh_token: credentials.refresh_token.clone(),
        })
    }
}

#[async_trait::async_trait]
impl AuthStrategy for BearerStrategy {
    fn auth_type(&self) -> AuthType {
        AuthType::Bearer
    }

    async fn authenticate(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        if let Some(data) = Self::reusable_token(credentials) {
            debug!(source_id = %source.id, "Reusing supplied bearer token");
            return Ok(data);
        }

        let client_id = require_field(&credentials.client_id, AuthType::Bearer, "clientId")?;
        let client_secret =
            require_field(&credentials.client_secret, AuthType::Bearer, "clientSecret")?;
        let token_url = source.require_url(AuthType::Bearer, keys::TOKEN_URL)?;

        debug!(source_id = %source.id, "Requesting client-credentials token");
        let grant = token::client_credentials(
            ctx,
            &token_url,
            client_id,
            client_secret,
            source.meta(keys::SCOPE),
        )
        .await?;

        Ok(grant.into_bearer())
    }

    async fn refresh(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        session: &Session,
    ) -> Result<SessionData> {
        if matches!(session.data, SessionData::Bearer { .. }) && !session.data.is_token_expired() {
            debug!(session_id = %session.session_id, "Bearer token still valid");
            return Ok(session.data.clone());
        }

        if let Some(refresh) = session.data.refresh_token() {
            match source.meta_url(AuthType::Bearer, keys::TOKEN_URL) {
                Ok(Some(token_url)) => match token::refresh_token(ctx, &token_url, refresh).await {
                    Ok(grant) => {
                        info!(session_id = %session.session_id, "Bearer token refreshed");
                        return Ok(grant.into_bearer());
                    }
                    Err(e) => {
                        warn!(
                            session_id = %session.session_id,
                            error = %e,
                            "Refresh token exchange failed, falling back to full authentication"
                        );
                    }
                },
                Ok(None) | Err(_) => {
                    warn!(
                        session_id = %session.session_id,
                        "No usable token URL for refresh, falling back to full authentication"
                    );
                }
            }
        }

        reauthenticate(self, ctx, source).await
    }
}
