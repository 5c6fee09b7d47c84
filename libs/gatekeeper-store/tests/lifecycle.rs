#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{MemoryError, MemoryStore};
use gatekeeper::test_support::{Fixture, NOTEBOOK, PAGE, Record, UPDATE_PERMISSION};
use gatekeeper::{GateKeeper, PermissionAction, Subject};
use gatekeeper_store::{SecureStore, SecureStoreError};

fn secure_store(fx: &Fixture, gk: &GateKeeper) -> SecureStore<MemoryStore> {
    SecureStore::new(MemoryStore::new(fx.db.clone(), gk.clone()), gk.clone())
}

#[tokio::test]
async fn owner_adds_a_page_to_own_notebook() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let store = secure_store(&fx, &gk);
    gk.context().set_current_principal(fx.principal(&fx.arthur));

    let page = fx
        .db
        .draft(Record::new(PAGE).link("notebook", &fx.arthurs_book));
    let stored = store.create(page).await.unwrap();

    assert!(stored.id().is_some());
    assert_eq!(fx.db.count(PAGE), 2);
    assert_eq!(store.inner().checking_seen(), [false]);
}

#[tokio::test]
async fn create_is_denied_even_while_scoping() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let store = secure_store(&fx, &gk);
    gk.context().set_current_principal(fx.principal(&fx.amy));

    let page = fx
        .db
        .draft(Record::new(PAGE).link("notebook", &fx.arthurs_book));
    let err = gk
        .context()
        .run_with_scoping(true, store.create(page))
        .await
        .unwrap_err();

    let denied = err.as_permission().unwrap();
    assert_eq!(denied.action(), PermissionAction::Create);
    assert_eq!(fx.db.count(PAGE), 1);
    assert!(store.inner().checking_seen().is_empty());
}

#[tokio::test]
async fn update_needs_an_update_permission() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let store = secure_store(&fx, &gk);

    gk.context().set_current_principal(fx.principal(&fx.arthur));
    let grant = fx.db.draft(
        Record::new(UPDATE_PERMISSION)
            .link("notebook", &fx.arthurs_book)
            .link("updater", &fx.amy),
    );

    gk.context().set_current_principal(fx.principal(&fx.amy));
    assert!(store.update(fx.arthurs_book.clone()).await.is_err());
    assert!(store.create(grant.clone()).await.is_err());

    gk.context().set_current_principal(fx.principal(&fx.arthur));
    store.create(grant).await.unwrap();

    gk.context().set_current_principal(fx.principal(&fx.amy));
    store.update(fx.arthurs_book.clone()).await.unwrap();
    assert!(store.destroy(fx.arthurs_book.clone()).await.is_err());
    assert_eq!(fx.db.count(UPDATE_PERMISSION), 1);
}

#[tokio::test]
async fn owner_destroys_notebook() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let store = secure_store(&fx, &gk);

    gk.context().set_current_principal(fx.principal(&fx.amy));
    let err = store.destroy(fx.arthurs_book.clone()).await.unwrap_err();
    let denied = err.as_permission().unwrap();
    assert_eq!(denied.action(), PermissionAction::Destroy);
    assert_eq!(
        denied.to_string(),
        format!(
            "Destroy denied for {} by {}",
            fx.arthurs_book.describe(),
            fx.amy.describe()
        )
    );

    gk.context().set_current_principal(fx.principal(&fx.arthur));
    store.destroy(fx.arthurs_book.clone()).await.unwrap();
    assert_eq!(fx.db.count(NOTEBOOK), 1);
    assert!(!gk.is_readable(Subject::Type(NOTEBOOK)));
}

#[tokio::test]
async fn store_failures_are_not_denials() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let store = secure_store(&fx, &gk);
    gk.context().set_current_principal(fx.principal(&fx.arthur));

    let draft = fx.new_notebook(Some(&fx.arthur));
    let err = store.update(draft).await.unwrap_err();

    assert!(err.as_permission().is_none());
    assert!(matches!(err, SecureStoreError::Store(MemoryError::NotFound(_))));
}
