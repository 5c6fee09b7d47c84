use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;

/// Closure guard over a type-erased instance; `None` means "cannot evaluate".
pub type GuardFn = dyn Fn(&dyn Entity) -> Option<bool> + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPolarity {
    If,
    Unless,
}

#[derive(Clone)]
pub enum GuardPredicate {
    /// A no-argument predicate looked up on the instance.
    Named(String),
    Closure(Arc<GuardFn>),
}

impl fmt::Debug for GuardPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Closure(_) => f.write_str("Closure(..)"),
        }
    }
}

/// A condition on the instance that must hold for a rule to grant.
#[derive(Debug, Clone)]
pub struct Guard {
    polarity: GuardPolarity,
    predicate: GuardPredicate,
}

impl Guard {
    #[must_use]
    pub fn new(polarity: GuardPolarity, predicate: GuardPredicate) -> Self {
        Self {
            polarity,
            predicate,
        }
    }

    #[must_use]
    pub fn polarity(&self) -> GuardPolarity {
        self.polarity
    }

    #[must_use]
    pub fn predicate(&self) -> &GuardPredicate {
        &self.predicate
    }

    /// Evaluates the guard; a predicate that cannot be evaluated fails it.
    #[must_use]
    pub fn passes(&self, instance: &dyn Entity) -> bool {
        let value = match &self.predicate {
            GuardPredicate::Named(name) => instance.predicate(name),
            GuardPredicate::Closure(f) => f(instance),
        };
        match (self.polarity, value) {
            (GuardPolarity::If, Some(value)) => value,
            (GuardPolarity::Unless, Some(value)) => !value,
            (_, None) => {
                tracing::debug!(
                    instance = %instance.describe(),
                    guard = ?self.predicate,
                    "guard could not be evaluated"
                );
                false
            }
        }
    }
}
