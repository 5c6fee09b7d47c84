#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use figment::Figment;
use figment::providers::{Format, Yaml};
use gatekeeper::test_support::{Fixture, NOTEBOOK, PAGE, PERSON, notebook_policies};
use gatekeeper::{
    GateKeeper, GateKeeperConfig, PermissionAction, PermissionSubject, PolicyRegistry,
    RuleDeclaration, Subject,
};

#[test]
fn owner_reads_and_updates_own_notebook() {
    let fx = Fixture::seeded();
    let gk = fx.gatekeeper(
        PolicyRegistry::builder()
            .declare(NOTEBOOK, "readable_by_my_owner")
            .unwrap()
            .declare(NOTEBOOK, "updatable_by_my_owner")
            .unwrap()
            .build(),
    );
    let book = Subject::from(&fx.arthurs_book);

    assert!(gk.authorize(book, PermissionAction::Update, &fx.principal(&fx.arthur)));
    assert!(!gk.authorize(book, PermissionAction::Update, &fx.principal(&fx.amy)));
    assert!(!gk.authorize(book, PermissionAction::Destroy, &fx.principal(&fx.arthur)));
}

#[test]
fn page_read_follows_its_notebook() {
    let fx = Fixture::seeded();
    fx.grant_update(&fx.amy, &fx.arthurs_book);
    let gk = fx.notebook_gatekeeper();

    for person in [&fx.admin, &fx.guest, &fx.arthur, &fx.amy] {
        let principal = fx.principal(person);
        assert_eq!(
            gk.authorize((&fx.arthurs_page).into(), PermissionAction::Read, &principal),
            gk.authorize((&fx.arthurs_book).into(), PermissionAction::Read, &principal),
        );
    }
    assert!(fx.allows(&gk, &fx.amy, PermissionAction::Read, &fx.arthurs_page));
    assert!(!fx.allows(&gk, &fx.guest, PermissionAction::Read, &fx.arthurs_page));
}

#[test]
fn updaters_gain_and_lose_access() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let amy = fx.principal(&fx.amy);
    let word = fx.add_word(&fx.arthurs_page, "hello");

    assert!(!gk.authorize((&fx.arthurs_book).into(), PermissionAction::Update, &amy));
    assert!(!gk.authorize((&fx.arthurs_page).into(), PermissionAction::Update, &amy));
    assert!(!gk.authorize((&word).into(), PermissionAction::Destroy, &amy));

    fx.grant_update(&fx.amy, &fx.arthurs_book);
    assert!(gk.authorize((&fx.arthurs_book).into(), PermissionAction::Update, &amy));
    assert!(gk.authorize((&fx.arthurs_book).into(), PermissionAction::Read, &amy));
    assert!(!gk.authorize((&fx.arthurs_book).into(), PermissionAction::Destroy, &amy));
    assert!(gk.authorize((&fx.arthurs_page).into(), PermissionAction::Update, &amy));
    assert!(gk.authorize((&word).into(), PermissionAction::Destroy, &amy));

    fx.revoke_update(&fx.amy, &fx.arthurs_book);
    assert!(!gk.authorize((&fx.arthurs_book).into(), PermissionAction::Update, &amy));
    assert!(!gk.authorize((&word).into(), PermissionAction::Update, &amy));
}

#[test]
fn words_are_crudable_through_the_notebook_owner() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let word = fx.add_word(&fx.arthurs_page, "hello");
    gk.context().set_current_principal(fx.principal(&fx.arthur));

    assert!(gk.is_crudable((&word).into()));

    gk.context().set_current_principal(fx.principal(&fx.amy));
    assert!(!gk.is_readable((&word).into()));
}

#[test]
fn unset_ghost_writer_falls_through_to_other_rules() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();

    assert!(fx.allows(&gk, &fx.arthur, PermissionAction::Update, &fx.arthurs_book));
    assert!(!fx.allows(&gk, &fx.amy, PermissionAction::Update, &fx.arthurs_book));

    let draft = fx.new_notebook(Some(&fx.arthur));
    assert!(fx.allows(&gk, &fx.arthur, PermissionAction::Create, &draft));
    let orphan = fx.new_notebook(None);
    assert!(!fx.allows(&gk, &fx.amy, PermissionAction::Create, &orphan));
}

#[test]
fn ghost_writer_acts_as_the_person() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    fx.set_ghost_writer(&fx.arthurs_book, &fx.amy);

    assert!(fx.allows(&gk, &fx.amy, PermissionAction::Update, &fx.arthurs_book));
    assert!(!fx.allows(&gk, &fx.amy, PermissionAction::Destroy, &fx.arthurs_book));
}

#[test]
fn person_rules_honour_their_guards() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let guest = fx.principal(&fx.guest);

    let newbie = fx.new_person("newbie");
    let impostor = fx.new_person("guest");
    assert!(gk.authorize((&newbie).into(), PermissionAction::Create, &guest));
    assert!(!gk.authorize((&impostor).into(), PermissionAction::Create, &guest));

    assert!(fx.allows(&gk, &fx.amy, PermissionAction::Update, &fx.amy));
    assert!(!gk.authorize((&fx.guest).into(), PermissionAction::Update, &guest));
    assert!(gk.authorize((&fx.amy).into(), PermissionAction::Read, &guest));
    assert!(fx.allows(&gk, &fx.admin, PermissionAction::Destroy, &fx.amy));
}

#[test]
fn admin_role_from_membership_after_refresh() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    let amy = fx.principal(&fx.amy);

    assert!(!gk.authorize((&fx.arthurs_book).into(), PermissionAction::Destroy, &amy));
    fx.add_role(&fx.amy, "admin");
    assert!(!gk.authorize((&fx.arthurs_book).into(), PermissionAction::Destroy, &amy));
    let refreshed = amy.refreshed();
    assert!(gk.authorize((&fx.arthurs_book).into(), PermissionAction::Destroy, &refreshed));
}

#[test]
fn class_level_create() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();

    gk.context().set_current_principal(fx.principal(&fx.admin));
    assert!(gk.is_creatable(Subject::Type(NOTEBOOK)));
    assert!(gk.is_crudable(Subject::Type(PERSON)));

    gk.context().set_current_principal(fx.principal(&fx.arthur));
    assert!(!gk.is_creatable(Subject::Type(NOTEBOOK)));
    assert!(gk.is_readable(Subject::Type(PERSON)));
}

#[test]
fn checkpoints_raise_regardless_of_scoping() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();
    gk.context().set_current_principal(fx.principal(&fx.amy));

    gk.context().run_with_scoping_sync(true, || {
        let err = gk.before_update(&fx.arthurs_book).unwrap_err();
        assert_eq!(err.action(), PermissionAction::Update);
        assert!(err.principal().is(fx.amy.as_ref()));

        let err = gk.before_destroy(&fx.arthurs_book).unwrap_err();
        assert_eq!(err.action(), PermissionAction::Destroy);

        let draft = fx.new_notebook(Some(&fx.arthur));
        let err = gk.before_create(&draft).unwrap_err();
        assert!(matches!(err.subject(), PermissionSubject::Instance(_)));
    });

    gk.before_update(&fx.amys_book).unwrap();
    gk.before_create(&fx.new_notebook(Some(&fx.amy))).unwrap();
    gk.before_destroy(&fx.amys_book).unwrap();
}

#[test]
fn bypass_allows_checkpoints() {
    let fx = Fixture::seeded();
    let gk = fx.notebook_gatekeeper();

    gk.context().bypass_sync(|| {
        gk.before_destroy(&fx.arthurs_book).unwrap();
    });
    assert!(gk.before_destroy(&fx.arthurs_book).is_err());
}

#[test]
fn policies_from_configuration() {
    let fx = Fixture::seeded();
    let yaml = r"
gatekeeper:
  permission_scoping: true
  max_delegation_depth: 4
  policies:
    notebook:
      - readable_by_my_owner
      - rule: readable_by_anyone
        if: is_public
    page:
      - readable_as_notebook
";
    let figment = Figment::from(Yaml::string(yaml));
    let config = GateKeeperConfig::from_figment(&figment).unwrap();
    let guest = fx.principal(&fx.guest);
    let gk = GateKeeper::from_config(
        &config,
        PolicyRegistry::builder(),
        Arc::new(move || guest.clone()),
    )
    .unwrap();

    assert!(gk.context().is_scoping_enabled());
    assert!(!gk.is_readable((&fx.arthurs_page).into()));

    fx.set_field(&fx.arthurs_book, "is_public", "true");
    assert!(gk.is_readable((&fx.arthurs_page).into()));
    assert!(!gk.is_readable((&fx.amys_book).into()));
}

#[test]
fn configured_policies_extend_declared_ones() {
    let fx = Fixture::seeded();
    let mut config = GateKeeperConfig::default();
    let rule = RuleDeclaration::Plain("destroyable_as_my_notebook".into());
    config.policies.insert(PAGE.to_owned(), vec![rule]);
    let arthur = fx.principal(&fx.arthur);

    let gk = GateKeeper::from_config(
        &config,
        notebook_policies().unwrap(),
        Arc::new(move || arthur.clone()),
    )
    .unwrap();

    assert!(gk.is_destroyable((&fx.arthurs_page).into()));
    assert!(gk.is_readable((&fx.arthurs_page).into()));
}
