//! Session Manager Integration Tests
//!
//! End-to-end tests for the SessionManager against mocked source endpoints:
//! - Session creation per protocol
//! - Token and cookie refresh
//! - Expiry, cleanup and deletion
//! - Error reporting

mod common;

use common::{MockServerFactory, MockSources, TestConfig, TestUtils, helpers};
use pretty_assertions::assert_eq;
use serde_json::json;
use source_auth::{
    AuthType, Error, ErrorCategory, SessionData,
    error::AuthFailureKind,
    types::{Credentials, SessionResponse, keys},
};
use tokio::time::{Duration, sleep};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_basic_session_headers() {
    TestUtils::init_logger();
    let manager = helpers::create_test_session_manager(TestConfig::minimal());

    let info = manager
        .create_session(&MockSources::basic(), Some(Credentials::login("u", "p")))
        .await
        .unwrap();

    let session = manager.get_session(&info.session_id).await.unwrap();
    assert!(session.expires_at > chrono::Utc::now());

    let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
    assert_eq!(headers.len(), 1);
    assert_eq!(headers["Authorization"], "Basic dTpw");
}

#[tokio::test]
async fn test_cookie_login_joins_cookies() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_login(&server, &["a=1; Path=/", "b=2; HttpOnly"]).await;

    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let info = manager
        .create_session(&MockSources::cookie(&server), Some(Credentials::login("u", "p")))
        .await
        .unwrap();
    assert_eq!(info.auth_type, AuthType::Cookie);

    let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
    let cookie = &headers["Cookie"];
    assert!(cookie.contains("a=1"));
    assert!(cookie.contains("b=2"));
}

#[tokio::test]
async fn test_cookie_login_without_cookies() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_login(&server, &[]).await;

    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let err = manager
        .create_session(&MockSources::cookie(&server), Some(Credentials::login("u", "p")))
        .await
        .unwrap_err();
    assert_eq!(err.auth_failure(), Some(AuthFailureKind::NoCookiesReceived));
    assert_eq!(manager.active_session_count().await, 0);
}

#[tokio::test]
async fn test_bearer_without_token_in_response() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_token_endpoint(&server, json!({"token_type": "Bearer"}), 1).await;

    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let result = manager
        .create_session(&MockSources::bearer(&server), Some(Credentials::client("c", "s")))
        .await;

    let err = result.as_ref().unwrap_err();
    assert!(matches!(err, Error::NoTokenInResponse { .. }));
    assert_eq!(err.category(), ErrorCategory::Authentication);

    let response = SessionResponse::from_result(&result);
    assert!(!response.success);
    assert_eq!(response.category, Some(ErrorCategory::Authentication));
}

#[tokio::test]
async fn test_bearer_supplied_token_makes_no_calls() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_token_endpoint(&server, json!({"access_token": "X"}), 0).await;

    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let credentials =
        Credentials::token("T0").with_expires_at(chrono::Utc::now() + chrono::Duration::hours(1));
    let info = manager
        .create_session(&MockSources::bearer(&server), Some(credentials))
        .await
        .unwrap();

    let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
    assert_eq!(headers["Authorization"], "Bearer T0");
}

#[tokio::test]
async fn test_bearer_refresh_reauthenticates_after_expiry() {
    TestUtils::init_logger();
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_token_endpoint(
        &server,
        json!({"access_token": "T", "expires_in": 1}),
        2,
    )
    .await;

    let credentials = Credentials::client("c", "s");
    let source = helpers::with_stored_credentials(MockSources::bearer(&server), &credentials);
    let manager = helpers::create_test_session_manager(TestConfig::minimal());

    let info = manager
        .create_session(&source, Some(credentials))
        .await
        .unwrap();

    sleep(Duration::from_millis(1100)).await;

    let refreshed = manager
        .refresh_session(&info.session_id, &source)
        .await
        .unwrap();
    assert_eq!(refreshed.session_id, info.session_id);
    assert_eq!(refreshed.auth_type, AuthType::Bearer);

    let session = manager.get_session(&info.session_id).await.unwrap();
    assert!(!session.data.is_token_expired());
    assert!(session.refreshed_at.is_some());
}

#[tokio::test]
async fn test_bearer_refresh_keeps_refresh_token() {
    let server = MockServerFactory::new().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "expires_in": 1,
            "refresh_token": "R1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("refresh_token=R1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "T2"})))
        .expect(1)
        .mount(&server)
        .await;

    let source = MockSources::bearer(&server);
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let info = manager
        .create_session(&source, Some(Credentials::client("c", "s")))
        .await
        .unwrap();

    sleep(Duration::from_millis(1100)).await;
    manager
        .refresh_session(&info.session_id, &source)
        .await
        .unwrap();

    let session = manager.get_session(&info.session_id).await.unwrap();
    assert_eq!(session.data.refresh_token(), Some("R1"));
    let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
    assert_eq!(headers["Authorization"], "Bearer T2");
}

#[tokio::test]
async fn test_failed_refresh_leaves_session_unchanged() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_login(&server, &["sid=first"]).await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    // No stored credentials, so the re-login after the failed probe cannot run
    let source = MockSources::cookie(&server)
        .with_metadata(keys::SESSION_CHECK_URL, format!("{}/me", server.uri()));
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let info = manager
        .create_session(&source, Some(Credentials::login("u", "p")))
        .await
        .unwrap();

    let err = manager
        .refresh_session(&info.session_id, &source)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Credential);

    let session = manager.get_session(&info.session_id).await.unwrap();
    assert_eq!(
        session.data,
        SessionData::Cookie {
            cookie: "sid=first".to_string()
        }
    );
    assert!(session.refreshed_at.is_none());
}

#[tokio::test]
async fn test_cookie_refresh_relogs_in_with_stored_credentials() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_login(&server, &["sid=fresh"]).await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Cookie", "sid=stale"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let source = helpers::with_stored_credentials(
        MockSources::cookie(&server)
            .with_metadata(keys::SESSION_CHECK_URL, format!("{}/me", server.uri())),
        &Credentials::login("u", "p"),
    );
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let info = manager
        .create_session(&source, Some(Credentials::default().with_cookie("sid=stale")))
        .await
        .unwrap();

    manager
        .refresh_session(&info.session_id, &source)
        .await
        .unwrap();
    let headers = manager.get_auth_headers(&info.session_id).await.unwrap();
    assert_eq!(headers["Cookie"], "sid=fresh");
}

#[tokio::test]
async fn test_not_required_source() {
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let source = MockSources::basic().with_authentication(false);

    let err = manager
        .create_session(&source, Some(Credentials::login("u", "p")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationNotRequired { .. }));
    assert_eq!(manager.active_session_count().await, 0);
}

#[tokio::test]
async fn test_session_expires_and_is_cleaned_up() {
    let manager = helpers::create_test_session_manager(TestConfig::with_ttl(1));

    let first = manager
        .create_session(&MockSources::basic(), Some(Credentials::login("u", "p")))
        .await
        .unwrap();
    let second = manager
        .create_session(&MockSources::basic(), Some(Credentials::login("u", "p")))
        .await
        .unwrap();

    sleep(Duration::from_millis(1100)).await;

    // Looking up an expired session removes it
    assert!(manager.get_session(&first.session_id).await.is_none());
    assert!(manager.get_auth_headers(&first.session_id).await.is_none());

    let longer = helpers::create_test_session_manager(TestConfig::minimal());
    assert_eq!(longer.cleanup_expired_sessions().await, 0);

    assert_eq!(manager.cleanup_expired_sessions().await, 1);
    assert!(manager.get_session(&second.session_id).await.is_none());
    assert_eq!(manager.cleanup_expired_sessions().await, 0);
}

#[tokio::test]
async fn test_cleanup_task_reaps_expired_sessions() {
    let mut settings = TestConfig::with_ttl(1);
    settings.session.cleanup_interval_secs = 1;
    let manager = helpers::create_test_session_manager(settings);

    manager
        .create_session(&MockSources::basic(), Some(Credentials::login("u", "p")))
        .await
        .unwrap();
    let store = manager.store();
    assert_eq!(store.len().await, 1);

    let handle = manager.start_cleanup();
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(store.len().await, 0);

    handle.stop().await;
}

#[tokio::test]
async fn test_delete_and_stale_ids() {
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let source = MockSources::basic();
    let info = manager
        .create_session(&source, Some(Credentials::login("u", "p")))
        .await
        .unwrap();

    assert!(manager.delete_session(&info.session_id).await);
    assert!(!manager.delete_session(&info.session_id).await);

    let err = manager
        .refresh_session(&info.session_id, &source)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionNotFound { .. }));
    assert_eq!(err.category(), ErrorCategory::Session);
}

#[tokio::test]
async fn test_source_mismatch_on_refresh() {
    let manager = helpers::create_test_session_manager(TestConfig::minimal());
    let info = manager
        .create_session(&MockSources::basic(), Some(Credentials::login("u", "p")))
        .await
        .unwrap();

    let other = MockSources::basic();
    let other = source_auth::Source { id: "other".to_string(), ..other };
    let err = manager
        .refresh_session(&info.session_id, &other)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceMismatch { .. }));
}

#[tokio::test]
async fn test_concurrent_session_creation() {
    let manager = helpers::create_test_session_manager(TestConfig::minimal());

    let mut handles = Vec::new();
    for i in 0..10 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager
                .create_session(
                    &MockSources::basic(),
                    Some(Credentials::login(format!("user{}", i), "p")),
                )
                .await
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let info = handle.await.unwrap().unwrap();
        ids.insert(info.session_id);
    }
    assert_eq!(ids.len(), 10);
    assert_eq!(manager.active_session_count().await, 10);
}
