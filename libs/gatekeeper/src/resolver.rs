//! Permission resolution.
//!
//! [`GateKeeper`] evaluates the rules registered for an entity type and
//! action as a short-circuit OR. Nothing matching means denied.

use std::sync::Arc;

use crate::action::PermissionAction;
use crate::chain::resolve;
use crate::config::{DEFAULT_MAX_DELEGATION_DEPTH, GateKeeperConfig};
use crate::context::AuthorizationContext;
use crate::entity::EntityRef;
use crate::error::{ConfigurationError, PermissionError, PermissionSubject};
use crate::principal::{Principal, PrincipalProvider};
use crate::registry::{PolicyRegistry, PolicyRegistryBuilder};
use crate::rules::{Rule, RuleTarget};

/// What a check is made against.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// Class-level check, before an instance exists. Only `anyone` and role
    /// rules without a guard can grant.
    Type(&'a str),
    Instance(&'a EntityRef),
}

impl Subject<'_> {
    #[must_use]
    pub fn entity_type(&self) -> &str {
        match self {
            Self::Type(entity_type) => entity_type,
            Self::Instance(entity) => entity.entity_type(),
        }
    }

    fn to_permission_subject(self) -> PermissionSubject {
        match self {
            Self::Type(entity_type) => PermissionSubject::Type(entity_type.to_owned()),
            Self::Instance(entity) => PermissionSubject::Instance(Arc::clone(entity)),
        }
    }
}

impl<'a> From<&'a EntityRef> for Subject<'a> {
    fn from(entity: &'a EntityRef) -> Self {
        Self::Instance(entity)
    }
}

/// The authorization engine: a frozen rule registry and its context.
#[derive(Debug, Clone)]
pub struct GateKeeper {
    registry: Arc<PolicyRegistry>,
    context: Arc<AuthorizationContext>,
    max_delegation_depth: usize,
}

impl GateKeeper {
    #[must_use]
    pub fn new(registry: PolicyRegistry, context: AuthorizationContext) -> Self {
        Self {
            registry: Arc::new(registry),
            context: Arc::new(context),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }

    /// Builds an engine from configuration: context defaults, delegation
    /// bound, and the configured policies on top of those in `builder`.
    ///
    /// # Errors
    ///
    /// The first configured declaration that fails to compile.
    pub fn from_config(
        config: &GateKeeperConfig,
        builder: PolicyRegistryBuilder,
        provider: Arc<dyn PrincipalProvider>,
    ) -> Result<Self, ConfigurationError> {
        let registry = builder.with_config(config)?.build();
        let context = AuthorizationContext::from_config(config, provider);
        let depth = config.max_delegation_depth;
        Ok(Self::new(registry, context).with_max_delegation_depth(depth))
    }

    #[must_use]
    pub fn with_max_delegation_depth(mut self, depth: usize) -> Self {
        self.max_delegation_depth = depth;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    #[must_use]
    pub fn context(&self) -> &AuthorizationContext {
        &self.context
    }

    /// Whether `principal` may perform `action` on `subject`.
    ///
    /// Always true while checking is disabled.
    #[must_use]
    pub fn authorize(
        &self,
        subject: Subject<'_>,
        action: PermissionAction,
        principal: &Principal,
    ) -> bool {
        if !self.context.is_checking_enabled() {
            return true;
        }
        self.evaluate(subject, action, principal, 0)
    }

    /// [`authorize`](Self::authorize) for the current principal.
    #[must_use]
    pub fn can(&self, subject: Subject<'_>, action: PermissionAction) -> bool {
        self.authorize(subject, action, &self.context.current_principal())
    }

    #[must_use]
    pub fn is_creatable(&self, subject: Subject<'_>) -> bool {
        self.can(subject, PermissionAction::Create)
    }

    #[must_use]
    pub fn is_readable(&self, subject: Subject<'_>) -> bool {
        self.can(subject, PermissionAction::Read)
    }

    #[must_use]
    pub fn is_updatable(&self, subject: Subject<'_>) -> bool {
        self.can(subject, PermissionAction::Update)
    }

    #[must_use]
    pub fn is_destroyable(&self, subject: Subject<'_>) -> bool {
        self.can(subject, PermissionAction::Destroy)
    }

    /// True when all four actions are authorized.
    #[must_use]
    pub fn is_crudable(&self, subject: Subject<'_>) -> bool {
        let principal = self.context.current_principal();
        PermissionAction::ALL
            .iter()
            .all(|&action| self.authorize(subject, action, &principal))
    }

    /// Fails with [`PermissionError`] unless the current principal may
    /// perform `action` on `subject`.
    ///
    /// # Errors
    ///
    /// [`PermissionError`] carrying the action, subject and principal.
    pub fn ensure(
        &self,
        subject: Subject<'_>,
        action: PermissionAction,
    ) -> Result<(), PermissionError> {
        let principal = self.context.current_principal();
        if self.authorize(subject, action, &principal) {
            return Ok(());
        }
        Err(PermissionError::new(action, subject.to_permission_subject(), principal))
    }

    /// Lifecycle checkpoint run before persisting a new instance.
    ///
    /// # Errors
    ///
    /// [`PermissionError`] when creation is denied, regardless of scoping.
    pub fn before_create(&self, instance: &EntityRef) -> Result<(), PermissionError> {
        self.ensure(Subject::Instance(instance), PermissionAction::Create)
    }

    /// Lifecycle checkpoint run before saving changes to an instance.
    ///
    /// # Errors
    ///
    /// [`PermissionError`] when the update is denied, regardless of scoping.
    pub fn before_update(&self, instance: &EntityRef) -> Result<(), PermissionError> {
        self.ensure(Subject::Instance(instance), PermissionAction::Update)
    }

    /// Lifecycle checkpoint run before deleting an instance.
    ///
    /// # Errors
    ///
    /// [`PermissionError`] when destruction is denied, regardless of scoping.
    pub fn before_destroy(&self, instance: &EntityRef) -> Result<(), PermissionError> {
        self.ensure(Subject::Instance(instance), PermissionAction::Destroy)
    }

    fn evaluate(
        &self,
        subject: Subject<'_>,
        action: PermissionAction,
        principal: &Principal,
        depth: usize,
    ) -> bool {
        let entity_type = subject.entity_type();
        let rules = self.registry.rules_for(entity_type, action);
        let granted = rules
            .iter()
            .any(|rule| self.rule_grants(rule, subject, principal, depth));
        tracing::debug!(
            entity_type,
            %action,
            granted,
            rules = rules.len(),
            depth,
            "authorization evaluated"
        );
        granted
    }

    fn rule_grants(
        &self,
        rule: &Rule,
        subject: Subject<'_>,
        principal: &Principal,
        depth: usize,
    ) -> bool {
        let Subject::Instance(instance) = subject else {
            if rule.guard.is_some() {
                return false;
            }
            return match &rule.target {
                RuleTarget::Anyone => true,
                RuleTarget::Role(name) => principal.has_role(name),
                _ => false,
            };
        };

        if let Some(guard) = &rule.guard
            && !guard.passes(instance.as_ref())
        {
            return false;
        }

        match &rule.target {
            RuleTarget::Anyone => true,
            RuleTarget::Itself => principal.is(instance.as_ref()),
            RuleTarget::Role(name) => principal.has_role(name),
            RuleTarget::Grant(chain) => {
                let members = resolve(instance.as_ref(), chain);
                members.contains(principal.entity().as_ref())
            }
            RuleTarget::Delegate { chain, action } => {
                if depth >= self.max_delegation_depth {
                    tracing::warn!(
                        entity_type = instance.entity_type(),
                        declaration = rule.declaration(),
                        max_depth = self.max_delegation_depth,
                        "delegation depth exceeded, denying"
                    );
                    return false;
                }
                let delegated = action.unwrap_or(rule.action);
                let related = resolve(instance.as_ref(), chain).into_entities();
                related.iter().any(|entity| {
                    self.evaluate(Subject::Instance(entity), delegated, principal, depth + 1)
                })
            }
        }
    }
}
