//! # Session Manager
//!
//! Public façade over the strategies, the vault and the session store.
//!
//! ## Architecture
//!
//! The [`SessionManager`] orchestrates:
//! - Strategy selection per source
//! - Credential decryption when none are supplied inline
//! - Session creation, refresh and teardown
//! - Header lookup for the fetch pipeline
//! - Expired session cleanup
//!
//! ## Examples
//!
//! ```rust,no_run
//! use source_auth::{SessionManager, Settings};
//! use source_auth::types::{Source, keys};
//!
//! # tokio_test::block_on(async {
//! let manager = SessionManager::from_settings(Settings::default())?;
//!
//! let source = Source::new("journal", "Journal")
//!     .with_authentication(true)
//!     .with_metadata(keys::AUTH_TYPE, "cookie")
//!     .with_metadata(keys::LOGIN_URL, "https://journal.example/login");
//!
//! let info = manager.create_session(&source, None).await?;
//! let headers = manager.get_auth_headers(&info.session_id).await;
//! println!("Session {} expires at {}: {:?}", info.session_id, info.expires_at, headers);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```
//!
//! ## Session Lifetime
//!
//! - Every session expires `session.ttl_secs` after creation or refresh
//! - Upstream token expiry never extends a session
//! - With `session.max_lifetime_secs` set, refreshes cannot push expiry past
//!   `created_at + max_lifetime`

use crate::{
    Error, Result,
    config::Settings,
    error::format_error_for_logging,
    session::{
        headers::{AuthHeaders, to_headers},
        network::{HttpTransport, NetworkManager},
        store::{CleanupHandle, SessionStore, generate_session_id},
    },
    strategy::{StrategyContext, StrategySet},
    types::{Credentials, Session, SessionInfo, Source},
    vault::CredentialVault,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Add whole seconds to an instant, saturating at the maximum timestamp
fn add_secs(instant: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Builder for [`SessionManager`]
#[derive(Debug, Default)]
pub struct SessionManagerBuilder {
    settings: Option<Settings>,
    vault: Option<Arc<CredentialVault>>,
    store: Option<Arc<SessionStore>>,
    http: Option<Arc<dyn HttpTransport>>,
}

impl SessionManagerBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these settings
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use this vault instead of one derived from the environment
    pub fn vault(mut self, vault: CredentialVault) -> Self {
        self.vault = Some(Arc::new(vault));
        self
    }

    /// Share an existing session store
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Outbound HTTP transport
    pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the manager
    ///
    /// Fails when no HTTP transport was configured, or when no vault was
    /// given and the master key variable is unset.
    pub fn build(self) -> Result<SessionManager> {
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;

        let http = self.http.ok_or_else(|| {
            Error::config("http_transport", "No HTTP transport configured")
        })?;

        let vault = match self.vault {
            Some(vault) => vault,
            None => Arc::new(CredentialVault::from_settings(&settings.vault)?),
        };

        let store = self.store.unwrap_or_default();
        let ctx = StrategyContext::new(http, Arc::clone(&vault))
            .with_request_timeout(settings.network.request_timeout());

        Ok(SessionManager {
            settings: Arc::new(settings),
            ctx,
            vault,
            store,
        })
    }
}

/// Session lifecycle orchestrator
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Credential vault
    vault: Arc<CredentialVault>,
    /// Session storage
    store: Arc<SessionStore>,
    /// Collaborators handed to strategies
    ctx: StrategyContext,
}

impl SessionManager {
    /// Start building a session manager
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::new()
    }

    /// Create a session manager with the default network stack
    ///
    /// The vault key is read from the variable named in `vault.master_key_env`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let network = NetworkManager::new(&settings)?;
        Self::builder()
            .http_transport(Arc::new(network))
            .settings(settings)
            .build()
    }

    /// Get the active settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the credential vault
    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// Get the shared session store
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    /// Authenticate against a source and store a new session
    ///
    /// Credentials are decrypted from the source record when `credentials`
    /// is `None`.
    pub async fn create_session(
        &self,
        source: &Source,
        credentials: Option<Credentials>,
    ) -> Result<SessionInfo> {
        if !source.requires_authentication {
            debug!(source_id = %source.id, "Source does not require authentication");
            return Err(Error::AuthenticationNotRequired {
                source_id: source.id.clone(),
            });
        }

        let strategy = StrategySet::for_source(source)?;
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => self.vault.credentials_for(source)?,
        };

        debug!(
            source_id = %source.id,
            auth_type = %strategy.auth_type(),
            "Authenticating source"
        );
        let data = strategy
            .authenticate(&self.ctx, source, &credentials)
            .await
            .inspect_err(|e| {
                warn!(
                    source_id = %source.id,
                    auth_type = %strategy.auth_type(),
                    details = %format_error_for_logging(e),
                    "Authentication failed"
                );
            })?;

        let expires_at = add_secs(Utc::now(), self.settings.session.ttl_secs);
        let session = Session::new(generate_session_id(), source.id.clone(), data, expires_at);
        let info = SessionInfo::from(&session);

        self.store.insert(session).await;
        info!(
            source_id = %source.id,
            auth_type = %info.auth_type,
            expires_at = %info.expires_at,
            "Session created"
        );

        Ok(info)
    }

    /// Get a live session
    pub async fn get_session(&self, session_id: &str) -> Option<Session> {
        self.store.get(session_id).await
    }

    /// Refresh a session's authentication material and extend its expiry
    ///
    /// A failed refresh leaves the stored session untouched.
    pub async fn refresh_session(&self, session_id: &str, source: &Source) -> Result<SessionInfo> {
        let session = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| Error::session_not_found(session_id))?;

        if session.source_id != source.id {
            warn!(
                session_id,
                expected = %session.source_id,
                actual = %source.id,
                "Refresh requested with a different source"
            );
            return Err(Error::SourceMismatch {
                session_id: session_id.to_string(),
                expected: session.source_id.clone(),
                actual: source.id.clone(),
            });
        }

        let lifetime_cap = self
            .settings
            .session
            .max_lifetime_secs
            .map(|max| add_secs(session.created_at, max));
        if let Some(cap) = lifetime_cap
            && Utc::now() >= cap
        {
            info!(session_id, "Session reached its maximum lifetime");
            self.store.remove(session_id).await;
            return Err(Error::session_not_found(session_id));
        }

        let strategy = StrategySet::for_type(session.auth_type);
        let refreshed = strategy
            .refresh(&self.ctx, source, &session)
            .await
            .inspect_err(|e| {
                warn!(
                    session_id,
                    auth_type = %session.auth_type,
                    details = %format_error_for_logging(e),
                    "Session refresh failed"
                );
            })?;

        let now = Utc::now();
        let mut expires_at = add_secs(now, self.settings.session.ttl_secs);
        if let Some(cap) = lifetime_cap {
            expires_at = expires_at.min(cap);
        }

        let data = session.data.clone().merge(refreshed);
        let updated = Session {
            auth_type: data.auth_type(),
            data,
            expires_at,
            refreshed_at: Some(now),
            ..session
        };
        let info = SessionInfo::from(&updated);

        if !self.store.replace(updated).await {
            debug!(session_id, "Session removed while refreshing");
            return Err(Error::session_not_found(session_id));
        }

        info!(session_id, expires_at = %info.expires_at, "Session refreshed");
        Ok(info)
    }

    /// Delete a session; `false` when it was already gone
    pub async fn delete_session(&self, session_id: &str) -> bool {
        match self.store.remove(session_id).await {
            Some(session) => {
                let was_live = !session.is_expired();
                info!(session_id, "Session deleted");
                was_live
            }
            None => false,
        }
    }

    /// Headers authenticating a request with the given session
    pub async fn get_auth_headers(&self, session_id: &str) -> Option<AuthHeaders> {
        let session = self.store.get(session_id).await?;
        Some(to_headers(session.auth_type, &session.data))
    }

    /// Remove expired sessions, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let removed = self.store.cleanup_expired().await;
        if removed > 0 {
            info!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Start the periodic cleanup task using the configured interval
    pub fn start_cleanup(&self) -> CleanupHandle {
        self.store
            .start_cleanup(self.settings.session.cleanup_interval())
    }

    /// Delete every session of a source
    pub async fn delete_sessions_for_source(&self, source_id: &str) -> usize {
        let removed = self.store.remove_for_source(source_id).await;
        if removed > 0 {
            info!(source_id, removed, "Deleted sessions for source");
        }
        removed
    }

    /// Number of unexpired sessions
    pub async fn active_session_count(&self) -> usize {
        self.store.live_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::network::{HttpRequest, HttpResponse};
    use crate::types::{AuthType, SessionData, keys};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Transport answering every request with a fixed response
    #[derive(Debug)]
    struct StubTransport {
        response: HttpResponse,
        calls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn new(response: HttpResponse) -> Arc<Self> {
            Arc::new(Self {
                response,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for StubTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.calls.lock().unwrap().push(request.url.clone());
            Ok(self.response.clone())
        }
    }

    fn manager_with(settings: Settings, transport: Arc<StubTransport>) -> SessionManager {
        SessionManager::builder()
            .settings(settings)
            .vault(CredentialVault::new("manager-test-secret").unwrap())
            .http_transport(transport)
            .build()
            .unwrap()
    }

    fn manager() -> SessionManager {
        manager_with(Settings::default(), StubTransport::new(HttpResponse::new(200, "")))
    }

    fn basic_source() -> Source {
        Source::new("s1", "Archive")
            .with_authentication(true)
            .with_metadata(keys::AUTH_TYPE, "basic")
    }

    #[test]
    fn test_build_requires_transport() {
        let result = SessionManager::builder()
            .vault(CredentialVault::new("secret").unwrap())
            .build();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_add_secs_saturates() {
        let now = Utc::now();
        assert_eq!(add_secs(now, 60), now + Duration::seconds(60));
        assert_eq!(add_secs(now, u64::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[tokio::test]
    async fn test_create_basic_session() {
        let manager = manager();
        let before = Utc::now();
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();

        assert_eq!(info.auth_type, AuthType::Basic);
        assert!(info.expires_at >= before + Duration::seconds(3600));

        let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
        assert_eq!(headers.get("Authorization").unwrap(), "Basic dTpw");
    }

    #[derive(Debug)]
    struct StalledTransport;

    #[async_trait::async_trait]
    impl HttpTransport for StalledTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_transport_bounded_by_request_timeout() {
        let mut settings = Settings::default();
        settings.network.request_timeout = 2;
        let manager = SessionManager::builder()
            .settings(settings)
            .vault(CredentialVault::new("manager-test-secret").unwrap())
            .http_transport(Arc::new(StalledTransport))
            .build()
            .unwrap();
        let source = basic_source().with_metadata(keys::AUTH_TEST_URL, "https://auth.test/check");

        let err = manager
            .create_session(&source, Some(Credentials::login("u", "p")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { duration_secs: 2, .. }));
        assert_eq!(manager.active_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_not_required_creates_nothing() {
        let manager = manager();
        let source = basic_source().with_authentication(false);
        let err = manager
            .create_session(&source, Some(Credentials::login("u", "p")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthenticationNotRequired { .. }));
        assert_eq!(manager.active_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_stored_credentials_are_decrypted() {
        let manager = manager();
        let stored = manager
            .vault()
            .encrypt_credentials(&Credentials::api_key("k-1"))
            .unwrap();
        let source = Source::new("s2", "Podcasts")
            .with_source_type("podcast")
            .with_authentication(true)
            .with_credentials(stored);

        let info = manager.create_session(&source, None).await.unwrap();
        assert_eq!(info.auth_type, AuthType::ApiKey);
        let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
        assert_eq!(headers.get("X-API-Key").unwrap(), "k-1");
    }

    #[tokio::test]
    async fn test_missing_stored_credentials() {
        let err = manager()
            .create_session(&basic_source(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCredentials { .. }));
    }

    #[tokio::test]
    async fn test_failed_authentication_stores_nothing() {
        let transport = StubTransport::new(HttpResponse::new(401, ""));
        let manager = manager_with(Settings::default(), transport.clone());
        let source = basic_source().with_metadata(keys::AUTH_TEST_URL, "https://x.test/check");

        let err = manager
            .create_session(&source, Some(Credentials::login("u", "p")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NonSuccessStatus { status: 401, .. }));
        assert_eq!(transport.call_count(), 1);
        assert_eq!(manager.active_session_count().await, 0);
    }

    #[tokio::test]
    async fn test_refresh_source_mismatch() {
        let manager = manager();
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();

        let other = Source::new("s9", "Other").with_authentication(true);
        let err = manager
            .refresh_session(&info.session_id, &other)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SourceMismatch { .. }));
    }

    #[tokio::test]
    async fn test_refresh_restamps_expiry() {
        let mut settings = Settings::default();
        settings.session.ttl_secs = 60;
        let manager = manager_with(settings, StubTransport::new(HttpResponse::new(200, "")));
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();

        let refreshed = manager
            .refresh_session(&info.session_id, &basic_source())
            .await
            .unwrap();
        assert_eq!(refreshed.session_id, info.session_id);
        assert!(refreshed.expires_at >= info.expires_at);

        let session = manager.get_session(&info.session_id).await.unwrap();
        assert!(session.refreshed_at.is_some());
        assert_eq!(
            session.data,
            SessionData::Basic {
                token: "dTpw".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_capped_by_max_lifetime() {
        let mut settings = Settings::default();
        settings.session.ttl_secs = 60;
        settings.session.max_lifetime_secs = Some(90);
        let manager = manager_with(settings, StubTransport::new(HttpResponse::new(200, "")));
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();
        let created_at = manager.get_session(&info.session_id).await.unwrap().created_at;

        let refreshed = manager
            .refresh_session(&info.session_id, &basic_source())
            .await
            .unwrap();
        assert!(refreshed.expires_at <= created_at + Duration::seconds(90));
    }

    #[tokio::test]
    async fn test_refresh_past_max_lifetime_ends_session() {
        let mut settings = Settings::default();
        settings.session.ttl_secs = 60;
        settings.session.max_lifetime_secs = Some(60);
        let manager = manager_with(settings, StubTransport::new(HttpResponse::new(200, "")));
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();

        let store = manager.store();
        let mut session = store.get(&info.session_id).await.unwrap();
        session.created_at = Utc::now() - Duration::seconds(120);
        store.insert(session).await;

        let err = manager
            .refresh_session(&info.session_id, &basic_source())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound { .. }));
        assert!(manager.get_session(&info.session_id).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let manager = manager();
        let info = manager
            .create_session(&basic_source(), Some(Credentials::login("u", "p")))
            .await
            .unwrap();

        assert!(manager.delete_session(&info.session_id).await);
        assert!(!manager.delete_session(&info.session_id).await);
        assert!(manager.get_auth_headers(&info.session_id).await.is_none());
        assert!(matches!(
            manager.refresh_session(&info.session_id, &basic_source()).await,
            Err(Error::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_sessions_for_source() {
        let manager = manager();
        for _ in 0..3 {
            manager
                .create_session(&basic_source(), Some(Credentials::login("u", "p")))
                .await
                .unwrap();
        }
        assert_eq!(manager.active_session_count().await, 3);
        assert_eq!(manager.delete_sessions_for_source("s1").await, 3);
        assert_eq!(manager.active_session_count().await, 0);
    }
}
