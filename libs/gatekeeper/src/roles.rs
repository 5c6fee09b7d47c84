//! Role resolution with per-principal memoization.

use std::collections::HashMap;

use arc_swap::ArcSwap;

use crate::entity::{Entity, EntityRef};

/// Memoized role answers for one principal entity.
///
/// Answers are never invalidated: once a role has been resolved, later
/// changes to the underlying role storage are only seen through a new cache.
/// Lookups read an immutable snapshot; a miss derives the answer and
/// publishes a new snapshot, so no lookup blocks on another.
#[derive(Debug)]
pub struct RoleCache {
    principal: EntityRef,
    answers: ArcSwap<HashMap<String, bool>>,
}

impl RoleCache {
    #[must_use]
    pub fn new(principal: EntityRef) -> Self {
        Self {
            principal,
            answers: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// The entity whose roles this cache answers for.
    #[must_use]
    pub fn principal(&self) -> &EntityRef {
        &self.principal
    }

    /// Answers whether the principal holds `role`, deriving it on first use.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        if let Some(&answer) = self.answers.load().get(role) {
            return answer;
        }
        let answer = derive_role(self.principal.as_ref(), role);
        tracing::trace!(role, answer, principal = %self.principal.describe(), "role resolved");
        self.answers.rcu(|answers| {
            let mut answers = (**answers).clone();
            answers.entry(role.to_owned()).or_insert(answer);
            answers
        });
        // A concurrent miss may have published first; its answer stands.
        self.answers.load().get(role).copied().unwrap_or(answer)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.load().is_empty()
    }
}

/// `is_<role>` predicate first, then the role-membership collection.
fn derive_role(principal: &dyn Entity, role: &str) -> bool {
    if principal.predicate(&format!("is_{role}")) == Some(true) {
        return true;
    }
    principal
        .role_names()
        .is_some_and(|names| names.iter().any(|name| name == role))
}
