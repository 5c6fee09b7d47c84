#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! In-memory entity graph used by the tests of this workspace.
//!
//! People own notebooks; notebooks have pages and update permissions (whose
//! holders are the notebook's `updaters`); pages have words, margin notes and
//! coffee stains. [`notebook_policies`] declares the rules these types are
//! checked with.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::action::PermissionAction;
use crate::context::AuthorizationContext;
use crate::entity::{Entity, EntityRef, Related};
use crate::error::ConfigurationError;
use crate::principal::Principal;
use crate::registry::{PolicyRegistry, PolicyRegistryBuilder};
use crate::resolver::GateKeeper;
use crate::rules::RuleOptions;

pub const PERSON: &str = "person";
pub const NOTEBOOK: &str = "notebook";
pub const PAGE: &str = "page";
pub const WORD: &str = "word";
pub const UPDATE_PERMISSION: &str = "update_permission";
pub const MARGIN_NOTE: &str = "margin_note";
pub const COFFEE_STAIN: &str = "coffee_stain";

/// A stored row: scalar fields, foreign keys and (for people) role names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub entity_type: &'static str,
    pub id: Uuid,
    pub fields: BTreeMap<&'static str, String>,
    pub links: BTreeMap<&'static str, Uuid>,
    pub roles: Vec<String>,
}

impl Record {
    #[must_use]
    pub fn new(entity_type: &'static str) -> Self {
        Self {
            entity_type,
            id: Uuid::new_v4(),
            fields: BTreeMap::new(),
            links: BTreeMap::new(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn link(mut self, name: &'static str, target: &EntityRef) -> Self {
        self.links
            .insert(name, target.id().expect("link target must be stored"));
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Association {
    /// Target type and the foreign key held by this row.
    BelongsTo(&'static str, &'static str),
    /// Target type and the foreign key held by the children.
    HasMany(&'static str, &'static str),
    /// A collection relation, then a scalar relation on each of its elements.
    Through(&'static str, &'static str),
}

fn association(entity_type: &str, name: &str) -> Option<Association> {
    use Association::{BelongsTo, HasMany, Through};

    Some(match (entity_type, name) {
        (PERSON, "notebooks") => HasMany(NOTEBOOK, "owner"),
        (NOTEBOOK, "owner") => BelongsTo(PERSON, "owner"),
        (NOTEBOOK, "ghost_writer") => BelongsTo(PERSON, "ghost_writer"),
        (NOTEBOOK, "pages") => HasMany(PAGE, "notebook"),
        (NOTEBOOK, "update_permissions") => HasMany(UPDATE_PERMISSION, "notebook"),
        (NOTEBOOK, "updaters") => Through("update_permissions", "updater"),
        (PAGE | UPDATE_PERMISSION, "notebook") => BelongsTo(NOTEBOOK, "notebook"),
        (PAGE, "words") => HasMany(WORD, "page"),
        (PAGE, "margin_notes") => HasMany(MARGIN_NOTE, "page"),
        (PAGE, "coffee_stains") => HasMany(COFFEE_STAIN, "page"),
        (WORD | MARGIN_NOTE | COFFEE_STAIN, "page") => BelongsTo(PAGE, "page"),
        (UPDATE_PERMISSION, "updater") => BelongsTo(PERSON, "updater"),
        _ => return None,
    })
}

/// Shared in-memory table of records, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Database {
    rows: Arc<RwLock<Vec<Record>>>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: Record) -> EntityRef {
        let (entity_type, id) = (record.entity_type, record.id);
        self.rows.write().push(record);
        self.stored(entity_type, id)
    }

    /// Replaces a stored record; `false` when it does not exist.
    pub fn update(&self, record: Record) -> bool {
        let mut rows = self.rows.write();
        let stored = rows
            .iter_mut()
            .find(|r| r.entity_type == record.entity_type && r.id == record.id);
        if let Some(row) = stored {
            *row = record;
            return true;
        }
        false
    }

    pub fn modify(&self, entity: &EntityRef, edit: impl FnOnce(&mut Record)) {
        let id = entity.id().expect("only stored rows can be modified");
        let mut rows = self.rows.write();
        let row = rows
            .iter_mut()
            .find(|r| r.entity_type == entity.entity_type() && r.id == id)
            .expect("row exists");
        edit(row);
    }

    pub fn delete(&self, entity_type: &str, id: Uuid) -> bool {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|r| !(r.entity_type == entity_type && r.id == id));
        rows.len() != before
    }

    #[must_use]
    pub fn find(&self, entity_type: &str, id: Uuid) -> Option<EntityRef> {
        let record = self.record(entity_type, id)?;
        Some(self.stored(record.entity_type, record.id))
    }

    #[must_use]
    pub fn all(&self, entity_type: &str) -> Vec<EntityRef> {
        self.rows
            .read()
            .iter()
            .filter(|r| r.entity_type == entity_type)
            .map(|r| self.stored(r.entity_type, r.id))
            .collect()
    }

    #[must_use]
    pub fn record(&self, entity_type: &str, id: Uuid) -> Option<Record> {
        self.rows
            .read()
            .iter()
            .find(|r| r.entity_type == entity_type && r.id == id)
            .cloned()
    }

    #[must_use]
    pub fn count(&self, entity_type: &str) -> usize {
        self.rows
            .read()
            .iter()
            .filter(|r| r.entity_type == entity_type)
            .count()
    }

    /// An instance that has not been stored yet.
    #[must_use]
    pub fn draft(&self, record: Record) -> EntityRef {
        Arc::new(Row {
            db: self.clone(),
            state: RowState::Draft(record),
        })
    }

    fn stored(&self, entity_type: &'static str, id: Uuid) -> EntityRef {
        Arc::new(Row {
            db: self.clone(),
            state: RowState::Stored { entity_type, id },
        })
    }

    fn children(&self, target: &str, key: &str, parent: Uuid) -> Vec<EntityRef> {
        self.rows
            .read()
            .iter()
            .filter(|r| r.entity_type == target && r.links.get(key) == Some(&parent))
            .map(|r| self.stored(r.entity_type, r.id))
            .collect()
    }
}

#[derive(Debug, Clone)]
enum RowState {
    Stored { entity_type: &'static str, id: Uuid },
    Draft(Record),
}

/// An entity backed by [`Database`]; stored rows always read live data.
#[derive(Debug, Clone)]
pub struct Row {
    db: Database,
    state: RowState,
}

impl Row {
    #[must_use]
    pub fn record(&self) -> Option<Record> {
        match &self.state {
            RowState::Stored { entity_type, id } => self.db.record(entity_type, *id),
            RowState::Draft(record) => Some(record.clone()),
        }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        self.record()?.fields.get(name).cloned()
    }
}

impl Entity for Row {
    fn entity_type(&self) -> &str {
        match &self.state {
            RowState::Stored { entity_type, .. } => entity_type,
            RowState::Draft(record) => record.entity_type,
        }
    }

    fn id(&self) -> Option<Uuid> {
        match &self.state {
            RowState::Stored { id, .. } => Some(*id),
            RowState::Draft(_) => None,
        }
    }

    fn relation(&self, name: &str) -> Option<Related> {
        match association(self.entity_type(), name)? {
            Association::BelongsTo(target, key) => {
                let id = *self.record()?.links.get(key)?;
                self.db.find(target, id).map(Related::One)
            }
            Association::HasMany(target, key) => {
                let children = self.id().map(|id| self.db.children(target, key, id));
                Some(Related::Many(children.unwrap_or_default()))
            }
            Association::Through(via, then) => {
                let Some(Related::Many(links)) = self.relation(via) else {
                    return None;
                };
                let linked = links.iter().filter_map(|link| scalar(link.relation(then)));
                Some(Related::Many(linked.collect()))
            }
        }
    }

    fn predicate(&self, name: &str) -> Option<bool> {
        match name {
            "is_admin" => Some(self.field("username")? == "administrator"),
            "is_guest" => Some(self.field("username")? == "guest"),
            flag => self.field(flag)?.parse().ok(),
        }
    }

    fn role_names(&self) -> Option<Vec<String>> {
        let record = self.record().filter(|r| r.entity_type == PERSON)?;
        Some(record.roles)
    }
}

fn scalar(related: Option<Related>) -> Option<EntityRef> {
    match related? {
        Related::One(entity) => Some(entity),
        Related::Many(_) => None,
    }
}

/// The rules the notebook domain is checked with.
///
/// # Errors
///
/// Never in practice; declarations are fixed.
pub fn notebook_policies() -> Result<PolicyRegistryBuilder, ConfigurationError> {
    let is_guest = |row: &Row| row.predicate("is_guest") == Some(true);
    let new_member = RuleOptions::new().unless_fn(is_guest);
    let not_guest = RuleOptions::new().unless_predicate("is_guest");
    PolicyRegistry::builder()
        .declare(PERSON, "crudable_by_admin")?
        .declare_with(PERSON, "creatable_by_guest", new_member)?
        .declare(PERSON, "readable_by_anyone")?
        .declare_with(PERSON, "updatable_by_self", not_guest)?
        .declare(NOTEBOOK, "crudable_by_admin")?
        .declare(NOTEBOOK, "crudable_by_my_owner")?
        .declare(NOTEBOOK, "crudable_as_my_ghost_writer")?
        .declare(NOTEBOOK, "readable_by_my_updaters")?
        .declare(NOTEBOOK, "updatable_by_my_updaters")?
        .declare(PAGE, "creatable_by_owner_of_my_notebook")?
        .declare(PAGE, "updatable_by_updaters_of_my_notebook")?
        .declare(PAGE, "readable_as_notebook")?
        .declare(WORD, "crudable_by_updaters_of_notebook_of_my_page")?
        .declare(WORD, "crudable_as_notebook_of_my_page")?
        .declare(UPDATE_PERMISSION, "creatable_by_owner_of_my_notebook")?
        .declare(UPDATE_PERMISSION, "readable_as_my_notebook")?
        .declare(UPDATE_PERMISSION, "destroyable_by_owner_of_my_notebook")?
        .declare(COFFEE_STAIN, "readable_as_my_page")
}

/// Seeded data: an administrator, a guest, arthur and amy with a notebook
/// each, and one page in arthur's notebook.
pub struct Fixture {
    pub db: Database,
    pub admin: EntityRef,
    pub guest: EntityRef,
    pub arthur: EntityRef,
    pub amy: EntityRef,
    pub arthurs_book: EntityRef,
    pub amys_book: EntityRef,
    pub arthurs_page: EntityRef,
}

impl Fixture {
    #[must_use]
    pub fn seeded() -> Self {
        let db = Database::new();
        let person = |username: &str| db.insert(Record::new(PERSON).field("username", username));
        let admin = person("administrator");
        let guest = person("guest");
        let arthur = person("arthur");
        let amy = person("amy");

        let arthurs_book = db.insert(notebook(&arthur, "arthur's notebook"));
        let amys_book = db.insert(notebook(&amy, "amy's notebook"));
        let arthurs_page = db.insert(Record::new(PAGE).link("notebook", &arthurs_book));

        Self {
            db,
            admin,
            guest,
            arthur,
            amy,
            arthurs_book,
            amys_book,
            arthurs_page,
        }
    }

    #[must_use]
    pub fn principal(&self, person: &EntityRef) -> Principal {
        Principal::new(Arc::clone(person))
    }

    /// An engine over `registry` whose provider answers with the guest.
    #[must_use]
    pub fn gatekeeper(&self, registry: PolicyRegistry) -> GateKeeper {
        let guest = self.principal(&self.guest);
        GateKeeper::new(
            registry,
            AuthorizationContext::new(Arc::new(move || guest.clone())),
        )
    }

    /// Whether `person` may perform `action` on `entity` under `gatekeeper`.
    pub fn allows(
        &self,
        gatekeeper: &GateKeeper,
        person: &EntityRef,
        action: PermissionAction,
        entity: &EntityRef,
    ) -> bool {
        gatekeeper.authorize(entity.into(), action, &self.principal(person))
    }

    /// An engine with [`notebook_policies`].
    #[must_use]
    pub fn notebook_gatekeeper(&self) -> GateKeeper {
        self.gatekeeper(notebook_policies().expect("policies compile").build())
    }

    pub fn add_notebook(&self, owner: &EntityRef, title: &str) -> EntityRef {
        self.db.insert(notebook(owner, title))
    }

    /// A notebook that has not been stored yet.
    #[must_use]
    pub fn new_notebook(&self, owner: Option<&EntityRef>) -> EntityRef {
        let record = Record::new(NOTEBOOK).field("title", "draft");
        self.db.draft(match owner {
            Some(owner) => record.link("owner", owner),
            None => record,
        })
    }

    #[must_use]
    pub fn new_person(&self, username: &str) -> EntityRef {
        let record = Record::new(PERSON).field("username", username);
        self.db.draft(record)
    }

    pub fn add_page(&self, notebook: &EntityRef) -> EntityRef {
        self.db.insert(Record::new(PAGE).link("notebook", notebook))
    }

    pub fn add_word(&self, page: &EntityRef, text: &str) -> EntityRef {
        let record = Record::new(WORD).field("text", text).link("page", page);
        self.db.insert(record)
    }

    pub fn add_margin_note(&self, page: &EntityRef) -> EntityRef {
        self.db.insert(Record::new(MARGIN_NOTE).link("page", page))
    }

    pub fn add_coffee_stain(&self, page: &EntityRef) -> EntityRef {
        self.db.insert(Record::new(COFFEE_STAIN).link("page", page))
    }

    /// Makes `person` one of the notebook's updaters.
    pub fn grant_update(&self, person: &EntityRef, notebook: &EntityRef) -> EntityRef {
        let record = Record::new(UPDATE_PERMISSION)
            .link("notebook", notebook)
            .link("updater", person);
        self.db.insert(record)
    }

    pub fn revoke_update(&self, person: &EntityRef, notebook: &EntityRef) {
        let notebook_id = notebook.id().expect("stored");
        for grant in self.db.children(UPDATE_PERMISSION, "notebook", notebook_id) {
            if let Some(Related::One(updater)) = grant.relation("updater")
                && updater.id() == person.id()
            {
                self.db.delete(UPDATE_PERMISSION, grant.id().expect("stored"));
            }
        }
    }

    pub fn set_ghost_writer(&self, notebook: &EntityRef, person: &EntityRef) {
        let id = person.id().expect("stored");
        self.db.modify(notebook, |record| {
            record.links.insert("ghost_writer", id);
        });
    }

    pub fn set_field(&self, entity: &EntityRef, name: &'static str, value: &str) {
        self.db.modify(entity, |record| {
            record.fields.insert(name, value.to_owned());
        });
    }

    pub fn add_role(&self, person: &EntityRef, role: &str) {
        self.db.modify(person, |record| record.roles.push(role.to_owned()));
    }
}

fn notebook(owner: &EntityRef, title: &str) -> Record {
    Record::new(NOTEBOOK)
        .field("title", title)
        .link("owner", owner)
}
