//! Pre-obtained OAuth tokens
//!
//! No authorization-code flow: the access token is supplied with the
//! credentials. Expired tokens are renewed through the refresh-token grant.

use super::{AuthStrategy, StrategyContext, token};
use crate::{
    Error, Result,
    types::{AuthType, Credentials, Session, SessionData, Source, keys, request::require_field},
};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct OAuthStrategy;

#[async_trait::async_trait]
impl AuthStrategy for OAuthStrategy {
    fn auth_type(&self) -> AuthType {
        AuthType::OAuth
    }

    async fn authenticate(
        &self,
        _ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        let access_token = require_field(&credentials.access_token, AuthType::OAuth, "accessToken")?;
        debug!(source_id = %source.id, "Accepting supplied OAuth token");

        Ok(SessionData::OAuth {
            access_token: access_token.to_string(),
            expires_at: credentials.expires_at,
            refresh_token: credentials
                .refresh_token
                .clone()
                .filter(|t| !t.is_empty()),
        })
    }

    async fn refresh(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        session: &Session,
    ) -> Result<SessionData> {
        if !session.data.is_token_expired() {
            return Ok(session.data.clone());
        }

        let Some(refresh) = session.data.refresh_token() else {
            return Err(Error::auth(
                "OAuth access token expired and no refresh token is available",
            ));
        };

        let token_url = source
            .meta_url(AuthType::OAuth, keys::TOKEN_URL)?
            .ok_or_else(|| Error::auth("OAuth access token expired and no token URL is configured"))?;

        let grant = token::refresh_token(ctx, &token_url, refresh).await?;
        info!(session_id = %session.session_id, "OAuth token refreshed");
        Ok(grant.into_oauth())
    }
}
