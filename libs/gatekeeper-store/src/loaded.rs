//! Fetched entities together with their preloaded associations.

use std::collections::BTreeMap;
use std::sync::Arc;

use gatekeeper::{EntityRef, Related};

use crate::include::Include;

/// A fetched entity and the associations loaded with it.
#[derive(Debug, Clone)]
pub struct Loaded {
    entity: EntityRef,
    pub(crate) associations: BTreeMap<String, LoadedRelation>,
}

/// A preloaded association.
#[derive(Debug, Clone)]
pub enum LoadedRelation {
    /// Scalar association; `None` when unset or hidden by scoping.
    One(Option<Box<Loaded>>),
    Many(Vec<Loaded>),
}

impl Loaded {
    #[must_use]
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            associations: BTreeMap::new(),
        }
    }

    /// Loads `entity` and walks `include` through its relations.
    #[must_use]
    pub fn eager(entity: EntityRef, include: &Include) -> Self {
        let associations = include
            .iter()
            .map(|(name, nested)| {
                let relation = match entity.relation(name) {
                    None => LoadedRelation::One(None),
                    Some(Related::One(related)) => {
                        LoadedRelation::One(Some(Box::new(Self::eager(related, nested))))
                    }
                    Some(Related::Many(related)) => LoadedRelation::Many(
                        related
                            .into_iter()
                            .map(|entity| Self::eager(entity, nested))
                            .collect(),
                    ),
                };
                (name.to_owned(), relation)
            })
            .collect();
        Self {
            entity,
            associations,
        }
    }

    #[must_use]
    pub fn with_association(mut self, name: impl Into<String>, relation: LoadedRelation) -> Self {
        self.associations.insert(name.into(), relation);
        self
    }

    #[must_use]
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    #[must_use]
    pub fn into_entity(self) -> EntityRef {
        self.entity
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&LoadedRelation> {
        self.associations.get(name)
    }

    /// The loaded scalar association `name`, if loaded and set.
    #[must_use]
    pub fn one(&self, name: &str) -> Option<&Loaded> {
        match self.associations.get(name)? {
            LoadedRelation::One(related) => related.as_deref(),
            LoadedRelation::Many(_) => None,
        }
    }

    /// The loaded collection `name`; empty when not loaded.
    #[must_use]
    pub fn many(&self, name: &str) -> &[Loaded] {
        match self.associations.get(name) {
            Some(LoadedRelation::Many(related)) => related,
            _ => &[],
        }
    }

    /// Whether both trees hold the same entities in the same shape.
    #[must_use]
    pub fn same_tree(&self, other: &Self) -> bool {
        gatekeeper::entity::same_entity(self.entity.as_ref(), other.entity.as_ref())
            && self.associations.len() == other.associations.len()
            && self
                .associations
                .iter()
                .zip(&other.associations)
                .all(|((name, left), (other_name, right))| {
                    name == other_name && left.same_tree(right)
                })
    }
}

impl LoadedRelation {
    fn same_tree(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::One(None), Self::One(None)) => true,
            (Self::One(Some(left)), Self::One(Some(right))) => left.same_tree(right),
            (Self::Many(left), Self::Many(right)) => {
                left.len() == right.len() && left.iter().zip(right).all(|(l, r)| l.same_tree(r))
            }
            _ => false,
        }
    }
}

impl From<EntityRef> for Loaded {
    fn from(entity: EntityRef) -> Self {
        Self::new(entity)
    }
}

impl From<&EntityRef> for Loaded {
    fn from(entity: &EntityRef) -> Self {
        Self::new(Arc::clone(entity))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use gatekeeper::test_support::Fixture;

    #[test]
    fn eager_walks_the_include_tree() {
        let fx = Fixture::seeded();
        fx.add_margin_note(&fx.arthurs_page);
        fx.add_word(&fx.arthurs_page, "hello");

        let include = Include::none()
            .relation("owner")
            .relation("ghost_writer")
            .with("pages", Include::none().relation("margin_notes"));
        let loaded = Loaded::eager(Arc::clone(&fx.arthurs_book), &include);

        assert!(loaded.one("owner").is_some());
        assert!(matches!(
            loaded.association("ghost_writer"),
            Some(LoadedRelation::One(None))
        ));
        let pages = loaded.many("pages");
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].many("margin_notes").len(), 1);
        assert!(pages[0].association("words").is_none());
    }

    #[test]
    fn same_tree_compares_shape_and_identity() {
        let fx = Fixture::seeded();
        let include = Include::none().relation("pages");

        let a = Loaded::eager(Arc::clone(&fx.arthurs_book), &include);
        let b = Loaded::eager(Arc::clone(&fx.arthurs_book), &include);
        let c = Loaded::eager(Arc::clone(&fx.amys_book), &include);

        assert!(a.same_tree(&b));
        assert!(!a.same_tree(&c));
        assert!(!a.same_tree(&Loaded::from(&fx.arthurs_book)));
    }
}
