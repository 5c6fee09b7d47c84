//! The host-side view of an entity that rules are evaluated against.
//!
//! The engine never talks to storage directly: every instance it checks is
//! reached through [`Entity`], which exposes named relations, named boolean
//! predicates (used by guards and `is_<role>` lookups) and, for principals,
//! role membership.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// Shared handle to a host entity.
pub type EntityRef = Arc<dyn Entity>;

/// Value of a named relation on an entity.
#[derive(Clone)]
pub enum Related {
    /// A scalar association that is set.
    One(EntityRef),
    /// A collection association (possibly empty).
    Many(Vec<EntityRef>),
}

impl fmt::Debug for Related {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(entity) => f.debug_tuple("One").field(entity).finish(),
            Self::Many(entities) => f.debug_tuple("Many").field(entities).finish(),
        }
    }
}

/// An entity instance as seen by the authorization engine.
///
/// Implementations must be cheap to query: relation lookups happen on every
/// association rule evaluation.
pub trait Entity: Any + Send + Sync {
    /// Registered type name used to look up rules.
    fn entity_type(&self) -> &str;

    /// Primary key, `None` for instances that were never persisted.
    fn id(&self) -> Option<Uuid>;

    /// Looks up a named relation.
    ///
    /// `None` means the association is unset or unknown; both are treated as
    /// "rule does not match" by the resolver.
    fn relation(&self, name: &str) -> Option<Related>;

    /// Evaluates a named no-argument boolean predicate (`is_guest`,
    /// `is_admin`, ...). `None` when the entity has no such predicate.
    fn predicate(&self, _name: &str) -> Option<bool> {
        None
    }

    /// Role names held by this entity when it acts as a principal.
    ///
    /// `None` when the entity exposes no role-membership collection.
    fn role_names(&self) -> Option<Vec<String>> {
        None
    }

    /// Human-readable identity used in diagnostics and error messages.
    fn describe(&self) -> String {
        match self.id() {
            Some(id) => format!("{}#{id}", self.entity_type()),
            None => format!("{}#new", self.entity_type()),
        }
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Identity comparison between two entities.
///
/// Persisted entities of the same type are equal when their ids are equal;
/// otherwise only the very same instance is equal to itself.
#[must_use]
pub fn same_entity(a: &dyn Entity, b: &dyn Entity) -> bool {
    if a.entity_type() != b.entity_type() {
        return false;
    }
    match (a.id(), b.id()) {
        (Some(left), Some(right)) => left == right,
        _ => std::ptr::addr_eq(a, b),
    }
}

/// Downcasts a type-erased entity to its concrete type.
#[must_use]
pub fn downcast<E: Entity>(entity: &dyn Entity) -> Option<&E> {
    let any: &dyn Any = entity;
    any.downcast_ref::<E>()
}
