//! Actions a rule can authorize and the permission keywords that expand to them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single CRUD-style action checked against a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Create,
    Read,
    Update,
    Destroy,
}

impl PermissionAction {
    /// All four actions, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Create, Self::Read, Self::Update, Self::Destroy];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }

    /// Capitalized form used in denial messages ("Read denied for ...").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Read => "Read",
            Self::Update => "Update",
            Self::Destroy => "Destroy",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for PermissionAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "destroy" => Ok(Self::Destroy),
            other => Err(UnknownAction(other.to_owned())),
        }
    }
}

/// The permission keyword that opens a rule declaration.
///
/// `Crudable` is shorthand for all four actions at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Crudable,
    Creatable,
    Readable,
    Updatable,
    Destroyable,
}

impl Permission {
    /// Parses the leading keyword of a declaration.
    ///
    /// Both `creatable`/`createable` and `updatable`/`updateable` are accepted.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "crudable" => Some(Self::Crudable),
            "creatable" | "createable" => Some(Self::Creatable),
            "readable" => Some(Self::Readable),
            "updatable" | "updateable" => Some(Self::Updatable),
            "destroyable" => Some(Self::Destroyable),
            _ => None,
        }
    }

    /// Actions this permission registers rules under.
    #[must_use]
    pub fn actions(self) -> &'static [PermissionAction] {
        match self {
            Self::Crudable => &PermissionAction::ALL,
            Self::Creatable => &[PermissionAction::Create],
            Self::Readable => &[PermissionAction::Read],
            Self::Updatable => &[PermissionAction::Update],
            Self::Destroyable => &[PermissionAction::Destroy],
        }
    }
}
