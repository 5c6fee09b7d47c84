//! Configuration for the authorization engine.

use std::collections::BTreeMap;

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::action::PermissionAction;
use crate::error::ConfigurationError;
use crate::rules::RuleOptions;

/// Key under which [`GateKeeperConfig`] is read from a [`Figment`].
pub const CONFIG_KEY: &str = "gatekeeper";

/// Default bound on nested `as` delegation.
pub const DEFAULT_MAX_DELEGATION_DEPTH: usize = 25;

/// Engine configuration.
///
/// ```yaml
/// gatekeeper:
///   enabled: true
///   permission_scoping: true
///   policies:
///     notebook:
///       - crudable_by_admin
///       - rule: crudable_by_my_owner
///         unless: is_archived
///     page:
///       - rule: destroyable_as_my_notebook
///         check: update
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateKeeperConfig {
    /// Process-wide default for permission checking.
    pub enabled: bool,
    /// Process-wide default for scoping (filter instead of raise on reads).
    pub permission_scoping: bool,
    /// Maximum nesting of `as` rules before a check is denied.
    pub max_delegation_depth: usize,
    /// Declarations per entity type, compiled at startup.
    pub policies: BTreeMap<String, Vec<RuleDeclaration>>,
}

impl Default for GateKeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            permission_scoping: false,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
            policies: BTreeMap::new(),
        }
    }
}

impl GateKeeperConfig {
    /// Extracts the `gatekeeper` section, falling back to defaults when the
    /// section is absent.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::Load`] when the section is present but invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigurationError> {
        if !figment.contains(CONFIG_KEY) {
            return Ok(Self::default());
        }
        figment
            .extract_inner(CONFIG_KEY)
            .map_err(|e| ConfigurationError::Load(e.to_string()))
    }
}

/// One configured declaration: a bare string or a string with options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDeclaration {
    Plain(String),
    Detailed(DetailedRule),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedRule {
    pub rule: String,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_predicate: Option<String>,
    #[serde(default, rename = "unless", skip_serializing_if = "Option::is_none")]
    pub unless_predicate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<PermissionAction>,
}

impl RuleDeclaration {
    #[must_use]
    pub fn declaration(&self) -> &str {
        match self {
            Self::Plain(rule) => rule,
            Self::Detailed(detailed) => &detailed.rule,
        }
    }

    /// Options to compile the declaration with. Validation happens in the
    /// compiler, so setting both `if` and `unless` fails there.
    pub fn options(&self) -> RuleOptions {
        let Self::Detailed(detailed) = self else {
            return RuleOptions::new();
        };
        let mut options = RuleOptions::new();
        if let Some(name) = &detailed.if_predicate {
            options = options.if_predicate(name.clone());
        }
        if let Some(name) = &detailed.unless_predicate {
            options = options.unless_predicate(name.clone());
        }
        if let Some(action) = detailed.check {
            options = options.check(action);
        }
        options
    }
}
