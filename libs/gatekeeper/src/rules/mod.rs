//! Compiled rule records.
//!
//! A declaration such as `updatable_by_updaters_of_my_notebook` is parsed
//! once, at registration time, into one [`Rule`] per action it implies.
//! Evaluation then dispatches over [`RuleTarget`] without ever looking at the
//! declaration string again.

mod compiler;
mod guard;

use std::fmt;
use std::sync::Arc;

pub use compiler::compile;
pub use guard::{Guard, GuardFn, GuardPolarity, GuardPredicate};

use crate::action::PermissionAction;
use crate::chain::RelationChain;
use crate::entity::{Entity, downcast};

/// What a rule tests the principal against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    /// Unconditional grant.
    Anyone,
    /// The principal is the instance itself.
    Itself,
    /// The principal holds the named role.
    Role(String),
    /// The principal is (a member of) whatever the chain resolves to.
    Grant(RelationChain),
    /// Whatever the chain resolves to authorizes `action` (or the rule's own
    /// action when `None`) for the same principal.
    Delegate {
        chain: RelationChain,
        action: Option<PermissionAction>,
    },
}

impl RuleTarget {
    /// Targets that can be evaluated without an instance.
    #[must_use]
    pub fn is_class_level(&self) -> bool {
        matches!(self, Self::Anyone | Self::Role(_))
    }
}

/// One compiled permission clause for an entity type and action.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) action: PermissionAction,
    pub(crate) target: RuleTarget,
    pub(crate) guard: Option<Guard>,
    pub(crate) declaration: Arc<str>,
}

impl Rule {
    #[must_use]
    pub fn action(&self) -> PermissionAction {
        self.action
    }

    #[must_use]
    pub fn target(&self) -> &RuleTarget {
        &self.target
    }

    #[must_use]
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// The declaration this rule was compiled from.
    #[must_use]
    pub fn declaration(&self) -> &str {
        &self.declaration
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.declaration, self.action)
    }
}

/// Options accepted next to a declaration.
///
/// At most one guard may be set; compiling a declaration with more is a
/// [`ConfigurationError::InvalidGuard`](crate::ConfigurationError::InvalidGuard).
///
/// ```ignore
/// let options = RuleOptions::new().unless_predicate("is_guest");
/// let registry = PolicyRegistry::builder()
///     .declare_with("person", "updatable_by_self", options)?
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RuleOptions {
    pub(crate) guards: Vec<Guard>,
    pub(crate) check: Option<PermissionAction>,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the grant only when the named instance predicate is true.
    pub fn if_predicate(self, name: impl Into<String>) -> Self {
        self.guarded(GuardPolarity::If, GuardPredicate::Named(name.into()))
    }

    /// Keep the grant only when the named instance predicate is false.
    pub fn unless_predicate(self, name: impl Into<String>) -> Self {
        self.guarded(GuardPolarity::Unless, GuardPredicate::Named(name.into()))
    }

    /// Keep the grant only when `f` returns true for the instance.
    ///
    /// Instances that are not an `E` fail the guard.
    pub fn if_fn<E, F>(self, f: F) -> Self
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.guarded(GuardPolarity::If, typed_closure(f))
    }

    /// Keep the grant only when `f` returns false for the instance.
    pub fn unless_fn<E, F>(self, f: F) -> Self
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.guarded(GuardPolarity::Unless, typed_closure(f))
    }

    /// For `as` rules: the action to check on the related entity.
    pub fn check(mut self, action: PermissionAction) -> Self {
        self.check = Some(action);
        self
    }

    fn guarded(mut self, polarity: GuardPolarity, predicate: GuardPredicate) -> Self {
        self.guards.push(Guard::new(polarity, predicate));
        self
    }
}

fn typed_closure<E, F>(f: F) -> GuardPredicate
where
    E: Entity,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    let predicate = move |entity: &dyn Entity| downcast::<E>(entity).map(&f);
    GuardPredicate::Closure(Arc::new(predicate))
}
