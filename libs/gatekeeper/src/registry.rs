//! Per-entity-type rule registry.

use std::collections::HashMap;

use crate::action::PermissionAction;
use crate::config::GateKeeperConfig;
use crate::error::ConfigurationError;
use crate::rules::{Rule, RuleOptions, compile};

type RuleTable = HashMap<String, HashMap<PermissionAction, Vec<Rule>>>;

/// Immutable mapping from (entity type, action) to the rules declared for it.
///
/// Rules keep their declaration order for diagnostics; evaluation is a pure
/// disjunction, so the order never changes a verdict.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    rules: RuleTable,
}

impl PolicyRegistry {
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::default()
    }

    /// Rules registered for `entity_type` under `action`; empty when none.
    #[must_use]
    pub fn rules_for(&self, entity_type: &str, action: PermissionAction) -> &[Rule] {
        self.rules
            .get(entity_type)
            .and_then(|by_action| by_action.get(&action))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Registered entity types, sorted.
    #[must_use]
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Total number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Collects declarations; [`PolicyRegistryBuilder::build`] freezes them.
#[derive(Debug, Default)]
#[must_use]
pub struct PolicyRegistryBuilder {
    rules: RuleTable,
}

impl PolicyRegistryBuilder {
    /// Declares a rule without options.
    ///
    /// # Errors
    ///
    /// See [`compile`].
    pub fn declare(self, entity_type: &str, declaration: &str) -> Result<Self, ConfigurationError> {
        self.declare_with(entity_type, declaration, RuleOptions::new())
    }

    /// Declares a rule with a guard or a delegated action.
    ///
    /// # Errors
    ///
    /// See [`compile`].
    pub fn declare_with(
        mut self,
        entity_type: &str,
        declaration: &str,
        options: RuleOptions,
    ) -> Result<Self, ConfigurationError> {
        let compiled = compile(declaration, options)?;
        tracing::debug!(
            entity_type,
            declaration,
            rules = compiled.len(),
            "rule declared"
        );
        let by_action = self.rules.entry(entity_type.to_owned()).or_default();
        for rule in compiled {
            by_action.entry(rule.action()).or_default().push(rule);
        }
        Ok(self)
    }

    /// Declares every rule listed under `policies` in the configuration.
    ///
    /// # Errors
    ///
    /// The first declaration that fails to compile.
    pub fn with_config(mut self, config: &GateKeeperConfig) -> Result<Self, ConfigurationError> {
        for (entity_type, declarations) in &config.policies {
            for declaration in declarations {
                let options = declaration.options();
                self = self.declare_with(entity_type, declaration.declaration(), options)?;
            }
        }
        Ok(self)
    }

    pub fn build(self) -> PolicyRegistry {
        let registry = PolicyRegistry { rules: self.rules };
        tracing::info!(
            entity_types = registry.rules.len(),
            rules = registry.len(),
            "policy registry built"
        );
        registry
    }
}
