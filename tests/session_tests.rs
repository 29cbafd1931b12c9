//! Session store integration tests
//! Login, logout and restore against the mock backend
//!
//! Run with: cargo test --test session_tests

mod common;

use common::{mint_token, MockBackend, ADMIN, DOCTOR, PASSWORD, ROOT_USER};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use clinic_portal::auth::{
    Credentials, FileStorage, MemoryStorage, PersistedSession, Registration, Role, SessionState,
    SessionStorage,
};
use clinic_portal::navigation::{self, MemoryNavigator};
use clinic_portal::{Error, Portal};

#[tokio::test]
async fn test_login_persists_and_restores_across_runs() {
    let backend = MockBackend::spawn().await;
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("session.json")));

    let (portal, _) = backend.portal_with(storage.clone(), navigation::LOGIN);
    portal.auth.restore_session().await.unwrap();
    let session = portal
        .auth
        .login(&Credentials::new(DOCTOR, PASSWORD))
        .await
        .unwrap();
    assert_eq!(session.role(), Role::Doctor);
    assert_eq!(session.clinic_id.as_deref(), Some("c1"));

    let record = storage.load().unwrap();
    assert_eq!(record.token.as_deref(), Some(session.token.as_str()));
    assert!(!record.is_super_admin);

    // A second run over the same file
    let (next_run, _) = backend.portal_with(storage.clone(), navigation::ROOT);
    assert_eq!(next_run.session.state(), SessionState::Resolving);
    let state = next_run.auth.restore_session().await.unwrap();
    let restored = state.session().expect("restored session").clone();
    assert_eq!(restored.user_id(), "u2");
    assert_eq!(restored.token, session.token);
}

#[tokio::test]
async fn test_failed_login_leaves_session_untouched() {
    let backend = MockBackend::spawn().await;
    let (portal, navigator, storage) = backend.portal(navigation::LOGIN);
    portal.auth.restore_session().await.unwrap();

    let result = portal
        .auth
        .login(&Credentials::new(DOCTOR, "wrong-password"))
        .await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(portal.session.state(), SessionState::Anonymous);
    assert!(storage.load().unwrap().is_empty());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_login_validates_before_sending() {
    let backend = MockBackend::spawn().await;
    let (portal, _, _) = backend.portal(navigation::LOGIN);

    let result = portal.auth.login(&Credentials::new("", "")).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(backend.seen_on("POST", "/auth/login").is_empty());
}

#[tokio::test]
async fn test_super_admin_login_requires_super_admin_role() {
    let backend = MockBackend::spawn().await;
    let (portal, _, storage) = backend.portal(navigation::SUPER_ADMIN_LOGIN);
    portal.auth.restore_session().await.unwrap();

    let result = portal
        .auth
        .login_super_admin(&Credentials::new(DOCTOR, PASSWORD))
        .await;
    assert!(matches!(result, Err(Error::Forbidden(_))));
    assert!(!portal.session.is_authenticated());
    assert!(storage.load().unwrap().is_empty());

    let session = portal
        .auth
        .login_super_admin(&Credentials::new(ROOT_USER, PASSWORD))
        .await
        .unwrap();
    assert!(session.elevated);
    assert!(storage.load().unwrap().is_super_admin);
    assert_eq!(portal.gate.landing_route(), "/super-admin");
}

#[tokio::test]
async fn test_register_logs_in_as_plain_user() {
    let backend = MockBackend::spawn().await;
    let (portal, _, _) = backend.portal(navigation::REGISTER);

    let session = portal
        .auth
        .register(&Registration::new("newbie", "newbie@clinic.test", "longenough"))
        .await
        .unwrap();
    assert_eq!(session.role(), Role::User);
    assert_eq!(portal.gate.landing_route(), navigation::ROOT);

    let short = Registration::new("other", "other@clinic.test", "short");
    assert!(matches!(
        portal.auth.register(&short).await,
        Err(Error::Validation(_))
    ));
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let backend = MockBackend::spawn().await;
    let (portal, _, storage) = backend.portal(navigation::LOGIN);
    portal
        .auth
        .login(&Credentials::new(ADMIN, PASSWORD))
        .await
        .unwrap();

    portal.auth.logout().unwrap();
    assert_eq!(portal.session.state(), SessionState::Anonymous);
    assert!(storage.load().unwrap().is_empty());

    portal.auth.logout().unwrap();
    assert_eq!(portal.session.state(), SessionState::Anonymous);
    assert!(portal.auth.get_session().is_none());
}

#[tokio::test]
async fn test_restore_without_record_is_anonymous() {
    let backend = MockBackend::spawn().await;
    let (portal, _, _) = backend.portal(navigation::ROOT);

    let state = portal.auth.restore_session().await.unwrap();
    assert_eq!(state, SessionState::Anonymous);
    assert!(backend.seen_on("GET", "/auth/me").is_empty());
}

#[tokio::test]
async fn test_restore_discards_expired_token_without_asking_server() {
    let backend = MockBackend::spawn().await;
    let storage = Arc::new(MemoryStorage::with_record(PersistedSession {
        token: Some(mint_token("u2", -60, 1)),
        ..PersistedSession::default()
    }));
    let (portal, navigator) = backend.portal_with(storage.clone(), "/doctor");

    let state = portal.auth.restore_session().await.unwrap();
    assert_eq!(state, SessionState::Anonymous);
    assert!(storage.load().unwrap().is_empty());
    assert!(backend.seen_on("GET", "/auth/me").is_empty());
    assert!(navigator.history().is_empty());
}

#[tokio::test]
async fn test_restore_clears_token_the_server_rejects() {
    let backend = MockBackend::spawn().await;
    let storage = Arc::new(MemoryStorage::with_record(backend.persisted(DOCTOR, false)));
    backend.revoke_all();
    let (portal, navigator) = backend.portal_with(storage.clone(), "/doctor/patients");

    let state = portal.auth.restore_session().await.unwrap();
    assert_eq!(state, SessionState::Anonymous);
    assert!(storage.load().unwrap().is_empty());
    assert!(portal.session.token().is_none());
    // The gate, not the restore, decides where to go next
    assert!(navigator.history().is_empty());

    let mut visit = portal.gate.visit("/admin");
    assert_eq!(visit.resolve().await.redirect_target(), Some(navigation::LOGIN));
    assert!(visit.render(|| "dashboard").is_none());
    assert_eq!(navigator.history(), vec![navigation::LOGIN.to_string()]);
}

#[tokio::test]
async fn test_restore_network_failure_keeps_stored_token() {
    let backend = MockBackend::spawn().await;
    let record = backend.persisted(DOCTOR, false);
    let storage = Arc::new(MemoryStorage::with_record(record.clone()));

    let config = common::config_for(&common::unreachable_base_url().await);
    let navigator = Arc::new(MemoryNavigator::new(navigation::ROOT));
    let portal = Portal::new(config, storage.clone(), navigator).unwrap();

    let result = portal.auth.restore_session().await;
    assert!(matches!(result, Err(Error::Http(_))));
    assert_eq!(portal.session.state(), SessionState::Anonymous);
    assert_eq!(storage.load().unwrap().token, record.token);
}

#[tokio::test]
async fn test_restore_sends_stored_token_to_matching_profile_endpoint() {
    let backend = MockBackend::spawn().await;
    let record = backend.persisted(ROOT_USER, true);
    let token = record.token.clone().unwrap();
    let storage = Arc::new(MemoryStorage::with_record(record));
    let (portal, _) = backend.portal_with(storage, "/super-admin");

    let state = portal.auth.restore_session().await.unwrap();
    let session = state.session().unwrap();
    assert!(session.elevated);
    assert_eq!(session.role(), Role::SuperAdmin);

    let seen = backend.seen_on("GET", "/auth/me");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization, Some(format!("Bearer {}", token)));
}

#[tokio::test]
async fn test_login_during_restore_wins() {
    let backend = MockBackend::spawn().await;
    let storage = Arc::new(MemoryStorage::with_record(backend.persisted(DOCTOR, false)));
    let (portal, _) = backend.portal_with(storage.clone(), navigation::LOGIN);
    backend.set_profile_delay(Duration::from_millis(300));

    let restoring = {
        let auth = portal.auth.clone();
        tokio::spawn(async move { auth.restore_session().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let admin = portal
        .auth
        .login(&Credentials::new(ADMIN, PASSWORD))
        .await
        .unwrap();
    restoring.await.unwrap().unwrap();

    let session = portal.auth.get_session().unwrap();
    assert_eq!(session.role(), Role::Admin);
    assert_eq!(session.token, admin.token);
    assert_eq!(storage.load().unwrap().token, Some(admin.token));
}

#[tokio::test]
async fn test_logout_during_restore_wins() {
    let backend = MockBackend::spawn().await;
    let storage = Arc::new(MemoryStorage::with_record(backend.persisted(DOCTOR, false)));
    let (portal, _) = backend.portal_with(storage.clone(), navigation::ROOT);
    backend.set_profile_delay(Duration::from_millis(300));

    let restoring = {
        let auth = portal.auth.clone();
        tokio::spawn(async move { auth.restore_session().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    portal.auth.logout().unwrap();

    let state = restoring.await.unwrap().unwrap();
    assert_eq!(state, SessionState::Anonymous);
    assert!(storage.load().unwrap().is_empty());
}

#[tokio::test]
async fn test_selected_clinic_survives_restore() {
    let backend = MockBackend::spawn().await;
    let storage = Arc::new(MemoryStorage::new());
    let (portal, _) = backend.portal_with(storage.clone(), navigation::LOGIN);
    portal
        .auth
        .login(&Credentials::new(ADMIN, PASSWORD))
        .await
        .unwrap();

    let session = portal.auth.select_clinic(Some("c9".to_string())).unwrap();
    assert_eq!(session.clinic_id.as_deref(), Some("c9"));

    let (next_run, _) = backend.portal_with(storage.clone(), navigation::ROOT);
    next_run.auth.restore_session().await.unwrap();
    assert_eq!(next_run.session.clinic_id().as_deref(), Some("c9"));

    let reverted = next_run.auth.select_clinic(None).unwrap();
    assert_eq!(reverted.clinic_id.as_deref(), Some("c1"));
}

#[tokio::test]
async fn test_select_clinic_requires_session() {
    let backend = MockBackend::spawn().await;
    let (portal, _, _) = backend.portal(navigation::ROOT);
    portal.auth.restore_session().await.unwrap();

    assert!(matches!(
        portal.auth.select_clinic(Some("c1".to_string())),
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_refresh_profile_uses_session_token() {
    let backend = MockBackend::spawn().await;
    let (portal, _, _) = backend.portal(navigation::LOGIN);
    let session = portal
        .auth
        .login(&Credentials::new(DOCTOR, PASSWORD))
        .await
        .unwrap();

    let refreshed = portal.auth.refresh_profile().await.unwrap();
    assert_eq!(refreshed.username(), "drhouse");

    let seen = backend.seen_on("GET", "/auth/me");
    assert_eq!(seen.last().unwrap().authorization, Some(format!("Bearer {}", session.token)));
}
