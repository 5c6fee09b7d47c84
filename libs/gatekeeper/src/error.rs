//! Error types for rule registration and authorization checkpoints.

use std::fmt;

use thiserror::Error;

use crate::action::PermissionAction;
use crate::entity::EntityRef;
use crate::principal::Principal;

/// A rule set that cannot be registered.
///
/// Raised while building a [`PolicyRegistry`](crate::PolicyRegistry); never
/// raised while checking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// The declaration does not follow `<permission>_<by|as>_<target>`.
    #[error("malformed rule declaration '{declaration}': {reason}")]
    Malformed { declaration: String, reason: String },

    /// The guard attached to a declaration is not usable.
    #[error("invalid guard on rule '{declaration}': {reason}")]
    InvalidGuard { declaration: String, reason: String },

    /// Configuration could not be extracted.
    #[error("failed to load gatekeeper configuration: {0}")]
    Load(String),
}

impl ConfigurationError {
    pub(crate) fn malformed(declaration: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            declaration: declaration.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_guard(declaration: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGuard {
            declaration: declaration.to_owned(),
            reason: reason.into(),
        }
    }
}

/// What a denied check was made against.
#[derive(Clone)]
pub enum PermissionSubject {
    Instance(EntityRef),
    /// Class-level check made before an instance exists.
    Type(String),
}

impl PermissionSubject {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Instance(entity) => entity.describe(),
            Self::Type(entity_type) => entity_type.clone(),
        }
    }

    #[must_use]
    pub fn entity_type(&self) -> &str {
        match self {
            Self::Instance(entity) => entity.entity_type(),
            Self::Type(entity_type) => entity_type,
        }
    }
}

impl fmt::Debug for PermissionSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(entity) => f.debug_tuple("Instance").field(entity).finish(),
            Self::Type(entity_type) => f.debug_tuple("Type").field(entity_type).finish(),
        }
    }
}

/// A denied action, raised by strict fetches and lifecycle checkpoints.
#[derive(Debug, Clone, Error)]
#[error("{} denied for {} by {}", .action.label(), .subject.describe(), .principal.describe())]
pub struct PermissionError {
    action: PermissionAction,
    subject: PermissionSubject,
    principal: Principal,
}

impl PermissionError {
    #[must_use]
    pub fn new(action: PermissionAction, subject: PermissionSubject, principal: Principal) -> Self {
        Self {
            action,
            subject,
            principal,
        }
    }

    #[must_use]
    pub fn action(&self) -> PermissionAction {
        self.action
    }

    #[must_use]
    pub fn subject(&self) -> &PermissionSubject {
        &self.subject
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
