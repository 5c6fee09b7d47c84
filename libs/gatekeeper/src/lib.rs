#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Declarative, per-entity-type authorization.
//!
//! Each entity type accumulates permission rules declared as short phrases:
//!
//! - `readable_by_anyone`, `updatable_by_self`, `crudable_by_admin`
//! - `destroyable_by_my_owner`, `updatable_by_updaters_of_my_notebook`
//! - `readable_as_notebook` (ask the page's notebook instead)
//!
//! Rules are compiled once into a [`PolicyRegistry`]. [`GateKeeper`]
//! answers whether a [`Principal`] may perform a [`PermissionAction`] on an
//! [`Entity`] by OR-ing every rule registered for that type and action.
//!
//! ## Usage
//!
//! ```ignore
//! use gatekeeper::{AuthorizationContext, GateKeeper, PolicyRegistry, RuleOptions};
//!
//! let registry = PolicyRegistry::builder()
//!     .declare("notebook", "crudable_by_admin")?
//!     .declare("notebook", "crudable_by_my_owner")?
//!     .declare_with("person", "updatable_by_self", RuleOptions::new().unless_predicate("is_guest"))?
//!     .declare("page", "readable_as_notebook")?
//!     .build();
//!
//! let gatekeeper = GateKeeper::new(registry, AuthorizationContext::new(provider));
//!
//! if gatekeeper.is_readable((&page).into()) { /* ... */ }
//! gatekeeper.before_update(&notebook)?;
//! ```

pub mod action;
pub mod chain;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod principal;
pub mod registry;
pub mod resolver;
pub mod roles;
pub mod rules;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use action::{Permission, PermissionAction};
pub use chain::{RelationChain, Resolved};
pub use config::{GateKeeperConfig, RuleDeclaration};
pub use context::AuthorizationContext;
pub use entity::{Entity, EntityRef, Related};
pub use error::{ConfigurationError, PermissionError, PermissionSubject};
pub use principal::{Principal, PrincipalProvider};
pub use registry::{PolicyRegistry, PolicyRegistryBuilder};
pub use resolver::{GateKeeper, Subject};
pub use rules::{Guard, GuardPolarity, Rule, RuleOptions, RuleTarget};
