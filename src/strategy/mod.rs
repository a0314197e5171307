//! Authentication strategies
//!
//! One strategy per [`AuthType`]. Each turns decrypted credentials plus
//! source metadata into [`SessionData`] and knows how to bring existing
//! session data back to a usable state.

pub mod api_key;
pub mod basic;
pub mod bearer;
pub mod cookie;
pub mod oauth;
pub mod token;

pub use api_key::{ApiKeyStrategy, DEFAULT_API_KEY_HEADER};
pub use basic::BasicStrategy;
pub use bearer::BearerStrategy;
pub use cookie::CookieStrategy;
pub use oauth::OAuthStrategy;

use crate::{
    Error, Result,
    config::NetworkSettings,
    session::network::{HttpRequest, HttpResponse, HttpTransport, redact_url},
    types::{AuthType, Credentials, Session, SessionData, Source},
    vault::CredentialVault,
};
use std::{sync::Arc, time::Duration};
use url::Url;

/// Collaborators available to a strategy call
#[derive(Debug, Clone)]
pub struct StrategyContext {
    /// Outbound HTTP
    pub http: Arc<dyn HttpTransport>,
    /// Vault used to re-read stored credentials on re-authentication
    pub vault: Arc<CredentialVault>,
    /// Upper bound on a single outbound request, whatever the transport
    pub request_timeout: Duration,
}

impl StrategyContext {
    /// Create a new strategy context with the default request timeout
    pub fn new(http: Arc<dyn HttpTransport>, vault: Arc<CredentialVault>) -> Self {
        Self {
            http,
            vault,
            request_timeout: NetworkSettings::default().request_timeout(),
        }
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send a request through the transport, bounded by `request_timeout`
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = redact_url(&request.url);
        match tokio::time::timeout(self.request_timeout, self.http.send(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                format!("auth request to {}", url),
                self.request_timeout.as_secs(),
            )),
        }
    }
}

/// Shared capability of every auth protocol
#[async_trait::async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Protocol implemented by this strategy
    fn auth_type(&self) -> AuthType;

    /// Produce fresh session data from credentials
    async fn authenticate(
        &self,
        ctx: &StrategyContext,
        source: &Source,
        credentials: &Credentials,
    ) -> Result<SessionData>;

    /// Bring session data back to a usable state
    ///
    /// Protocols without expiring material return the data unchanged.
    async fn refresh(
        &self,
        _ctx: &StrategyContext,
        _source: &Source,
        session: &Session,
    ) -> Result<SessionData> {
        Ok(session.data.clone())
    }
}

/// Dispatch table from protocol to strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySet;

impl StrategySet {
    /// Strategy implementing the given protocol
    pub fn for_type(auth_type: AuthType) -> &'static dyn AuthStrategy {
        match auth_type {
            AuthType::Basic => &BasicStrategy,
            AuthType::Bearer => &BearerStrategy,
            AuthType::ApiKey => &ApiKeyStrategy,
            AuthType::Cookie => &CookieStrategy,
            AuthType::OAuth => &OAuthStrategy,
        }
    }

    /// Strategy for a source, resolved from its metadata
    pub fn for_source(source: &Source) -> Result<&'static dyn AuthStrategy> {
        Ok(Self::for_type(source.auth_type()?))
    }
}

/// Probe a validation endpoint; statuses of 400 and above are rejections
pub(crate) async fn validate_endpoint(
    ctx: &StrategyContext,
    url: &Url,
    headers: Vec<(String, String)>,
) -> Result<()> {
    let request = HttpRequest::get(url.as_str()).with_headers(headers);
    let response = ctx.send(request).await?;

    if !response.is_success() {
        return Err(Error::NonSuccessStatus {
            status: response.status,
            endpoint: redact_url(url.as_str()),
        });
    }

    Ok(())
}

/// Run `authenticate` again with the credentials stored on the source
pub(crate) async fn reauthenticate(
    strategy: &dyn AuthStrategy,
    ctx: &StrategyContext,
    source: &Source,
) -> Result<SessionData> {
    tracing::info!(
        source_id = %source.id,
        auth_type = %strategy.auth_type(),
        "Re-authenticating with stored credentials"
    );
    let credentials = ctx.vault.credentials_for(source)?;
    strategy.authenticate(ctx, source, &credentials).await
}
