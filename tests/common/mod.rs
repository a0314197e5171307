//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use source_auth::{
    CredentialVault, SessionManager, Settings,
    session::NetworkManager,
    types::{Credentials, Source, keys},
};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Master secret used by every test vault
pub const TEST_MASTER_SECRET: &str = "integration-test-master-secret";

/// Test helper functions
pub mod helpers {
    use super::*;

    /// Vault keyed with the shared test secret
    pub fn test_vault() -> CredentialVault {
        CredentialVault::new(TEST_MASTER_SECRET).expect("test vault")
    }

    /// Session manager over the real network stack
    pub fn create_test_session_manager(settings: Settings) -> SessionManager {
        let network = NetworkManager::new(&settings).expect("network manager");
        SessionManager::builder()
            .settings(settings)
            .vault(test_vault())
            .http_transport(Arc::new(network))
            .build()
            .expect("session manager")
    }

    /// Attach credentials encrypted with the test vault
    pub fn with_stored_credentials(source: Source, credentials: &Credentials) -> Source {
        let encrypted = test_vault()
            .encrypt_credentials(credentials)
            .expect("encrypt credentials");
        source.with_credentials(encrypted)
    }
}

/// Test configuration factory
pub struct TestConfig;

impl TestConfig {
    /// Create minimal test configuration
    pub fn minimal() -> Settings {
        let mut settings = Settings::default();
        settings.logging.level = "debug".to_string();
        settings.network.connect_timeout = 5;
        settings.network.request_timeout = 5;
        settings
    }

    /// Minimal configuration with a short session TTL
    pub fn with_ttl(ttl_secs: u64) -> Settings {
        let mut settings = Self::minimal();
        settings.session.ttl_secs = ttl_secs;
        settings
    }
}

/// Source record factory
pub struct MockSources;

impl MockSources {
    /// Basic-auth source without validation URL
    pub fn basic() -> Source {
        Source::new("basic-src", "Archive")
            .with_authentication(true)
            .with_metadata(keys::AUTH_TYPE, "basic")
    }

    /// Bearer source pointing at the mock token endpoint
    pub fn bearer(server: &MockServer) -> Source {
        Source::new("bearer-src", "Metrics API")
            .with_authentication(true)
            .with_metadata(keys::AUTH_TYPE, "bearer")
            .with_metadata(keys::TOKEN_URL, format!("{}/oauth/token", server.uri()))
    }

    /// Academic source defaulting to cookie login against the mock server
    pub fn cookie(server: &MockServer) -> Source {
        Source::new("cookie-src", "Journal")
            .with_source_type("academic")
            .with_authentication(true)
            .with_metadata(keys::LOGIN_URL, format!("{}/login", server.uri()))
    }
}

/// Mock server factory
pub struct MockServerFactory;

impl MockServerFactory {
    /// Create new mock server
    pub async fn new() -> MockServer {
        MockServer::start().await
    }

    /// Token endpoint answering with the given JSON body
    pub async fn setup_token_endpoint(
        server: &MockServer,
        body: serde_json::Value,
        expected_calls: u64,
    ) {
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    /// Login endpoint setting the given cookies
    pub async fn setup_login(server: &MockServer, cookies: &[&str]) {
        let mut response = ResponseTemplate::new(302).insert_header("Location", "/home");
        for cookie in cookies {
            response = response.append_header("Set-Cookie", *cookie);
        }
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(response)
            .mount(server)
            .await;
    }
}

/// Test utilities
pub struct TestUtils;

impl TestUtils {
    /// Initialize test logging
    pub fn init_logger() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }
}
