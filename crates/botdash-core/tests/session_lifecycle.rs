//! Session lifecycle tests against a mock backend.
//!
//! These tests use wiremock to stand in for the dashboard API and an
//! in-memory credential slot, so no network access or keychain is needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use botdash_core::auth::{Credential, MemoryTokenStore, TokenStore};
use botdash_core::models::User;
use botdash_core::{ApiClient, ApiError, Redirect, SessionState, SessionStatus, SessionStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, store: Arc<MemoryTokenStore>) -> ApiClient {
    ApiClient::new(format!("{}/api", server.uri()), store).unwrap()
}

fn alice_json() -> serde_json::Value {
    json!({ "id": 42, "email": "a@b.com", "name": "Alice" })
}

fn alice() -> User {
    User {
        id: 42,
        email: "a@b.com".into(),
        display_name: "Alice".into(),
        created_at: None,
    }
}

/// Credential slot whose operations can be made to fail
#[derive(Default)]
struct FaultyStore {
    inner: MemoryTokenStore,
    fail_load: bool,
    fail_save: bool,
    fail_clear: bool,
    clears: AtomicUsize,
}

impl FaultyStore {
    fn holding(token: &str) -> Self {
        Self {
            inner: MemoryTokenStore::with_token(token),
            ..Default::default()
        }
    }
}

impl TokenStore for FaultyStore {
    fn load(&self) -> anyhow::Result<Option<Credential>> {
        if self.fail_load {
            anyhow::bail!("slot unreadable");
        }
        self.inner.load()
    }

    fn save(&self, credential: &Credential) -> anyhow::Result<()> {
        if self.fail_save {
            anyhow::bail!("slot read-only");
        }
        self.inner.save(credential)
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear {
            anyhow::bail!("slot locked");
        }
        self.inner.clear()
    }
}

/// Session invariant: authenticated iff identity iff stored credential
fn assert_consistent(session: &SessionStore, store: &MemoryTokenStore) {
    let stored = store.load().unwrap().is_some();
    let status = session.status();
    let identity = session.identity();
    assert_eq!(status == SessionStatus::Authenticated, identity.is_some());
    assert_eq!(identity.is_some(), stored, "status {:?}", status);
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "right" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login ok",
            "user": alice_json(),
            "access_token": "fresh-token"
        })))
        .mount(server)
        .await;
}

async fn mount_login_rejected(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "wrong" })))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Hydration
// ============================================================================

#[tokio::test]
async fn test_hydration_without_credential_skips_get_me() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": alice_json() })))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_hydration_restores_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", "Bearer saved-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 42, "email": "a@b.com", "name": "Alice", "created_at": "2024-01-01T00:00:00" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("saved-token"));
    let session = SessionStore::new(client(&server, store.clone()));
    assert_eq!(session.status(), SessionStatus::Hydrating);

    session.hydrate().await;

    let user = session.identity().unwrap();
    assert_eq!(user.id, 42);
    assert_eq!(user.display_name, "Alice");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_hydration_with_rejected_credential_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "msg": "Token has expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("expired-token"));
    let session = SessionStore::connect(client(&server, store.clone())).await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_hydration_with_unreachable_backend_is_anonymous() {
    let store = Arc::new(MemoryTokenStore::with_token("saved-token"));
    // Nothing listens on port 1
    let api = ApiClient::new("http://127.0.0.1:1/api", store.clone()).unwrap();
    let session = SessionStore::connect(api).await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_hydration_runs_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": alice_json() })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("saved-token"));
    let session = SessionStore::new(client(&server, store));

    tokio::join!(session.hydrate(), session.hydrate());
    session.hydrate().await;

    assert_eq!(session.wait_until_ready().await, SessionState::Authenticated(alice()));
}

#[tokio::test]
async fn test_wait_until_ready_resolves_after_hydration() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = Arc::new(SessionStore::new(client(&server, store)));

    let waiter = {
        let session = session.clone();
        tokio::spawn(async move { session.wait_until_ready().await })
    };
    session.hydrate().await;

    assert_eq!(waiter.await.unwrap(), SessionState::Anonymous);
}

// ============================================================================
// Login / register / logout
// ============================================================================

#[tokio::test]
async fn test_login_failure_leaves_state_unchanged() {
    let server = MockServer::start().await;
    mount_login_rejected(&server).await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    let err = session.login("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_failure_keeps_existing_session() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_login_rejected(&server).await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;
    session.login("a@b.com", "right").await.unwrap();

    assert!(session.login("a@b.com", "wrong").await.is_err());

    assert_eq!(session.identity(), Some(alice()));
    assert_eq!(store.load().unwrap().unwrap().as_str(), "fresh-token");
}

#[tokio::test]
async fn test_login_success_stores_credential() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    let redirect = session.login("a@b.com", "right").await.unwrap();

    assert_eq!(redirect, Redirect::Dashboard);
    assert_eq!(store.load().unwrap().unwrap().as_str(), "fresh-token");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.identity(), Some(alice()));
}

#[tokio::test]
async fn test_register_success_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({ "email": "a@b.com", "password": "secret1", "name": "Alice" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user": alice_json(),
            "token": "new-account-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    let redirect = session.register("a@b.com", "secret1", "Alice").await.unwrap();

    assert_eq!(redirect.path(), "/dashboard");
    assert_eq!(store.load().unwrap().unwrap().as_str(), "new-account-token");
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_register_duplicate_email_reports_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Email already registered" })),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    let err = session.register("a@b.com", "secret1", "Alice").await.unwrap_err();

    assert_eq!(err.to_string(), "Email already registered");
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_logout_from_any_state() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;

    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionStore::connect(client(&server, store.clone())).await;

    // Anonymous -> Anonymous
    assert_eq!(session.logout().unwrap(), Redirect::Home);
    assert_eq!(session.status(), SessionStatus::Anonymous);

    // Authenticated -> Anonymous
    session.login("a@b.com", "right").await.unwrap();
    assert_eq!(session.logout().unwrap(), Redirect::Home);
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
    assert_consistent(&session, &store);
}

#[tokio::test]
async fn test_invariant_holds_across_operation_sequence() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_login_rejected(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": alice_json() })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("fresh-token"));
    let session = SessionStore::connect(client(&server, store.clone())).await;
    assert_consistent(&session, &store);

    let steps: [&str; 7] = ["logout", "wrong", "right", "right", "wrong", "logout", "right"];
    for step in steps {
        match step {
            "logout" => {
                session.logout().unwrap();
            }
            password => {
                let _ = session.login("a@b.com", password).await;
            }
        }
        assert_consistent(&session, &store);
    }
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_credential_round_trip_through_client() {
    let store = Arc::new(MemoryTokenStore::new());
    let api = ApiClient::new("http://127.0.0.1:1/api", store.clone()).unwrap();

    let token = "eyJ0eXAiOiJKV1QifQ.e30.sig-with-=padding==";
    store.save(&Credential::new(token)).unwrap();

    assert_eq!(api.get_token().unwrap().as_str(), token);
    // Reading has no side effects
    assert_eq!(api.get_token().unwrap().as_str(), token);
}

// ============================================================================
// Storage failures and races
// ============================================================================

#[tokio::test]
async fn test_logout_that_cannot_clear_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": alice_json() })))
        .mount(&server)
        .await;

    let store = Arc::new(FaultyStore {
        fail_clear: true,
        ..FaultyStore::holding("saved-token")
    });
    let api = ApiClient::new(format!("{}/api", server.uri()), store.clone()).unwrap();
    let session = SessionStore::connect(api.clone()).await;
    assert_eq!(session.status(), SessionStatus::Authenticated);

    let err = session.logout().unwrap_err();

    assert!(matches!(err, ApiError::Storage(_)));
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(store.load().unwrap().unwrap().as_str(), "saved-token");

    // Nothing was lost: a fresh start restores the same session
    let restarted = SessionStore::connect(api).await;
    assert_eq!(restarted.identity(), Some(alice()));
}

#[tokio::test]
async fn test_hydration_with_unreadable_slot_discards_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": alice_json() })))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(FaultyStore {
        fail_load: true,
        ..FaultyStore::holding("garbled")
    });
    let api = ApiClient::new(format!("{}/api", server.uri()), store.clone()).unwrap();
    let session = SessionStore::connect(api).await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(store.clears.load(Ordering::SeqCst), 1);
    assert!(store.inner.load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_whose_token_cannot_be_stored_changes_nothing() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;

    let store = Arc::new(FaultyStore {
        fail_save: true,
        ..Default::default()
    });
    let api = ApiClient::new(format!("{}/api", server.uri()), store.clone()).unwrap();
    let session = SessionStore::connect(api).await;

    let err = session.login("a@b.com", "right").await.unwrap_err();

    assert!(matches!(err, ApiError::Storage(_)));
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.identity().is_none());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_during_hydration_keeps_fresh_token() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "msg": "Token has expired" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("stale-token"));
    let session = SessionStore::new(client(&server, store.clone()));

    // Hydration reads the stale token and waits on /auth/me while login completes
    let ((), login) = tokio::join!(session.hydrate(), session.login("a@b.com", "right"));

    assert_eq!(login.unwrap(), Redirect::Dashboard);
    assert_eq!(session.identity(), Some(alice()));
    assert_eq!(store.load().unwrap().unwrap().as_str(), "fresh-token");
    assert_consistent(&session, &store);
}
