//! Identity manager tests.

mod common;

use common::{MockBackend, login, tenant};
use parley_client::{Error, IdentityManager};
use types::{Identity, LoginCredentials, Tenant};

#[tokio::test]
async fn guest_is_issued_once() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());

    let first = manager.ensure_guest(&tenant()).await.unwrap();
    let second = manager.ensure_guest(&tenant()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(backend.state().guests_issued, 1);
    assert!(manager.current().is_some_and(Identity::is_guest));
    assert_eq!(manager.generation(), 0);
}

#[tokio::test]
async fn failed_issuance_leaves_no_identity() {
    let backend = MockBackend::default();
    backend.state().fail_guest = true;
    let mut manager = IdentityManager::new(backend.clone(), tenant());

    let err = manager.ensure_guest(&tenant()).await.unwrap_err();
    assert!(matches!(err, Error::Identity(_)));
    assert!(err.is_recoverable());
    assert!(manager.current().is_none());

    backend.state().fail_guest = false;
    manager.ensure_guest(&tenant()).await.unwrap();
    assert!(manager.current().is_some());
}

#[tokio::test]
async fn authenticate_replaces_guest() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    let rx = manager.subscribe();
    let guest = manager.ensure_guest(&tenant()).await.unwrap();

    let identity = manager.authenticate(&login()).await.unwrap();
    assert!(identity.is_authenticated());
    assert_ne!(identity.token(), &guest);
    assert_eq!(identity.profile().unwrap().email, "ada@example.com");
    assert_eq!(manager.generation(), 1);
    assert!(rx.has_changed().unwrap());
    assert_eq!(manager.member_credential().unwrap().expose(), "user-1");
}

#[tokio::test]
async fn failed_login_keeps_guest() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    let guest = manager.ensure_guest(&tenant()).await.unwrap();

    let err = manager
        .authenticate(&LoginCredentials::new("ada@example.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Identity(_)));
    assert_eq!(manager.current().unwrap().token(), &guest);
    assert_eq!(manager.generation(), 0);
}

#[tokio::test]
async fn release_issues_fresh_guest() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    let first = manager.ensure_guest(&tenant()).await.unwrap();
    manager.authenticate(&login()).await.unwrap();

    let guest = manager.release().await.unwrap();
    assert_ne!(guest, first);
    assert!(manager.current().is_some_and(Identity::is_guest));
    assert_eq!(backend.state().guests_issued, 2);
    assert_eq!(manager.generation(), 2);
    assert!(matches!(
        manager.member_credential(),
        Err(Error::NotAuthenticated)
    ));
}

#[tokio::test]
async fn release_as_guest_keeps_generation() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    let guest = manager.ensure_guest(&tenant()).await.unwrap();

    assert_eq!(manager.release().await.unwrap(), guest);
    assert_eq!(manager.generation(), 0);
}

#[tokio::test]
async fn refresh_rotates_token_in_place() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    manager.authenticate(&login()).await.unwrap();

    let token = manager.refresh().await.unwrap();
    assert_eq!(token.expose(), "rotated-1");
    assert_eq!(manager.member_credential().unwrap(), token);
    assert_eq!(
        manager.current().and_then(Identity::profile).unwrap().id,
        "u1"
    );
    assert_eq!(manager.generation(), 1);
}

#[tokio::test]
async fn guest_cannot_refresh() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    manager.ensure_guest(&tenant()).await.unwrap();

    assert!(matches!(
        manager.refresh().await,
        Err(Error::NotAuthenticated)
    ));
    assert_eq!(backend.state().refreshes, 0);
}

#[tokio::test]
async fn tenant_switch_discards_identity() {
    let backend = MockBackend::default();
    let mut manager = IdentityManager::new(backend.clone(), tenant());
    let acme = manager.ensure_guest(&tenant()).await.unwrap();

    let other = Tenant::new("globex");
    let globex = manager.ensure_guest(&other).await.unwrap();
    assert_ne!(acme, globex);
    assert_eq!(globex.expose(), "guest-globex-2");
    assert_eq!(manager.tenant(), &other);
    assert_eq!(manager.generation(), 1);
}
