//! Form login producing a cookie session

use super::{AuthStrategy, StrategyContext};
use crate::{
    Error, Result,
    session::network::{HttpRequest, redact_url},
    types::{AuthType, Credentials, Session, SessionData, Source, keys, request::require_field},
};
use tracing::{debug, info, warn};

const DEFAULT_USERNAME_FIELD: &str = "username";
const DEFAULT_PASSWORD_FIELD: &str = "password";

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieStrategy;

impl CookieStrategy {
    async fn login(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        let username = require_field(&credentials.username, AuthType::Cookie, "username")?;
        let password = require_field(&credentials.password, AuthType::Cookie, "password")?;
        let login_url = source.require_url(AuthType::Cookie, keys::LOGIN_URL)?;

        let username_field = source
            .meta(keys::USERNAME_FIELD)
            .unwrap_or(DEFAULT_USERNAME_FIELD);
        let password_field = source
            .meta(keys::PASSWORD_FIELD)
            .unwrap_or(DEFAULT_PASSWORD_FIELD);

        let mut form = vec![
            (username_field.to_string(), username.to_string()),
            (password_field.to_string(), password.to_string()),
        ];
        form.extend(source.additional_form_fields(AuthType::Cookie)?);

        debug!(source_id = %source.id, "Submitting login form");
        let response = ctx
            .http
            .send(HttpRequest::post_form(login_url.as_str(), form))
            .await?;

        let endpoint = redact_url(login_url.as_str());
        if !response.is_success() {
            return Err(Error::NonSuccessStatus {
                status: response.status,
                endpoint,
            });
        }

        let cookies = response.cookie_pairs();
        if cookies.is_empty() {
            return Err(Error::NoCookiesReceived { endpoint });
        }

        debug!(source_id = %source.id, count = cookies.len(), "Login returned cookies");
        Ok(SessionData::Cookie {
            cookie: cookies.join("; "),
        })
    }

    async fn relogin(&self, ctx: &StrategyContext, source: &Source) -> Result<SessionData> {
        info!(source_id = %source.id, "Re-running login with stored credentials");
        let mut credentials = ctx.vault.credentials_for(source)?;
        // A stored cookie is what just went stale
        credentials.cookie = None;
        self.login(ctx, source, &credentials).await
    }
}

#[async_trait::async_trait]
impl AuthStrategy for CookieStrategy {
    fn auth_type(&self) -> AuthType {
        AuthType::Cookie
    }

    async fn authenticate(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData> {
        if let Some(cookie) = credentials.cookie.as_deref().filter(|c| !c.is_empty()) {
            debug!(source_id = %source.id, "Reusing supplied cookie");
            return Ok(SessionData::Cookie {
                cookie: cookie.to_string(),
            });
        }

        self.login(ctx, source, credentials).await
    }

    async fn refresh(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        session: &Session,
    ) -> Result<SessionData> {
        let SessionData::Cookie { cookie } = &session.data else {
            return self.relogin(ctx, source).await;
        };

        let Some(check_url) = source.meta_url(AuthType::Cookie, keys::SESSION_CHECK_URL)? else {
            return Ok(session.data.clone());
        };

        let probe = HttpRequest::get(check_url.as_str()).with_header("Cookie", cookie.clone());
        match ctx.send(probe).await {
            Ok(response) if response.is_success() => {
                debug!(session_id = %session.session_id, "Cookie session still valid");
                Ok(session.data.clone())
            }
            Ok(response) => {
                warn!(
                    session_id = %session.session_id,
                    status = response.status,
                    "Cookie session rejected by check URL"
                );
                self.relogin(ctx, source).await
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "Cookie session check failed"
                );
                self.relogin(ctx, source).await
            }
        }
    }
}
