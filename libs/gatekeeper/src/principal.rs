//! The acting identity checks are made for.

use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, EntityRef, same_entity};
use crate::roles::RoleCache;

/// An acting identity together with its role cache.
///
/// Clones share the cache; [`Principal::refreshed`] starts a new one.
#[derive(Clone)]
pub struct Principal {
    roles: Arc<RoleCache>,
}

impl Principal {
    #[must_use]
    pub fn new(entity: EntityRef) -> Self {
        Self {
            roles: Arc::new(RoleCache::new(entity)),
        }
    }

    #[must_use]
    pub fn entity(&self) -> &EntityRef {
        self.roles.principal()
    }

    /// Whether this principal is the given entity.
    #[must_use]
    pub fn is(&self, other: &dyn Entity) -> bool {
        same_entity(self.entity().as_ref(), other)
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.has_role(role)
    }

    /// Same identity, empty role cache.
    #[must_use]
    pub fn refreshed(&self) -> Self {
        Self::new(Arc::clone(self.entity()))
    }

    #[must_use]
    pub fn describe(&self) -> String {
        self.entity().describe()
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("entity", self.entity())
            .field("cached_roles", &self.roles.len())
            .finish()
    }
}

/// Supplies the principal for the current unit of work.
pub trait PrincipalProvider: Send + Sync {
    fn current_principal(&self) -> Principal;
}

impl<F> PrincipalProvider for F
where
    F: Fn() -> Principal + Send + Sync,
{
    fn current_principal(&self) -> Principal {
        self()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    #[test]
    fn clones_share_the_role_cache() {
        let fx = Fixture::seeded();
        let amy = Principal::new(Arc::clone(&fx.amy));
        let same_amy = amy.clone();

        assert!(!amy.has_role("editor"));
        fx.add_role(&fx.amy, "editor");

        assert!(!same_amy.has_role("editor"));
        assert!(amy.refreshed().has_role("editor"));
    }

    #[test]
    fn caches_of_different_principals_are_independent() {
        let fx = Fixture::seeded();
        fx.add_role(&fx.arthur, "editor");
        let amy = Principal::new(Arc::clone(&fx.amy));
        let arthur = Principal::new(Arc::clone(&fx.arthur));

        assert!(!amy.has_role("editor"));
        assert!(arthur.has_role("editor"));
    }

    #[test]
    fn is_compares_identity() {
        let fx = Fixture::seeded();
        let arthur = Principal::new(Arc::clone(&fx.arthur));

        assert!(arthur.is(fx.arthur.as_ref()));
        assert!(!arthur.is(fx.amy.as_ref()));
    }

    #[test]
    fn closures_provide_principals() {
        let fx = Fixture::seeded();
        let amy = Principal::new(Arc::clone(&fx.amy));
        let provider = move || amy.clone();

        assert!(provider.current_principal().is(fx.amy.as_ref()));
    }
}
