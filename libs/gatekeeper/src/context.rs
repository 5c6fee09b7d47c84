//! Authorization context: checking and scoping switches plus the current
//! principal.
//!
//! Process-wide defaults are fixed when the context is built. Temporary
//! overrides (`run_with_checking`, `run_with_scoping`, `run_as`) are
//! flow-local: they live in a tokio task-local slot, apply to everything
//! awaited or called inside the unit of work, and are gone once it returns,
//! fails, panics, or is dropped. Concurrent flows never see each other's
//! overrides, and tasks spawned from inside an override do not inherit it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use uuid::Uuid;

use crate::config::GateKeeperConfig;
use crate::principal::{Principal, PrincipalProvider};

#[derive(Clone, Default)]
struct Overrides {
    checking: Option<bool>,
    scoping: Option<bool>,
    principal: Option<Principal>,
}

type FlowOverrides = HashMap<Uuid, Overrides>;

tokio::task_local! {
    static FLOW: FlowOverrides;
}

/// Switches and principal lookup consulted by every check.
pub struct AuthorizationContext {
    id: Uuid,
    checking_default: bool,
    scoping_default: bool,
    provider: Arc<dyn PrincipalProvider>,
    pinned: ArcSwapOption<Principal>,
}

impl AuthorizationContext {
    /// Checking enabled, scoping disabled.
    #[must_use]
    pub fn new(provider: Arc<dyn PrincipalProvider>) -> Self {
        Self {
            id: Uuid::new_v4(),
            checking_default: true,
            scoping_default: false,
            provider,
            pinned: ArcSwapOption::empty(),
        }
    }

    #[must_use]
    pub fn from_config(config: &GateKeeperConfig, provider: Arc<dyn PrincipalProvider>) -> Self {
        Self {
            checking_default: config.enabled,
            scoping_default: config.permission_scoping,
            ..Self::new(provider)
        }
    }

    #[must_use]
    pub fn is_checking_enabled(&self) -> bool {
        self.overrides().checking.unwrap_or(self.checking_default)
    }

    #[must_use]
    pub fn is_scoping_enabled(&self) -> bool {
        self.overrides().scoping.unwrap_or(self.scoping_default)
    }

    /// Runs `unit` with checking forced on or off.
    pub async fn run_with_checking<F: Future>(&self, enabled: bool, unit: F) -> F::Output {
        let flow = self.next_flow(|o| o.checking = Some(enabled));
        FLOW.scope(flow, unit).await
    }

    pub fn run_with_checking_sync<T>(&self, enabled: bool, unit: impl FnOnce() -> T) -> T {
        let flow = self.next_flow(|o| o.checking = Some(enabled));
        FLOW.sync_scope(flow, unit)
    }

    /// Runs `unit` with checking disabled.
    pub async fn bypass<F: Future>(&self, unit: F) -> F::Output {
        self.run_with_checking(false, unit).await
    }

    pub fn bypass_sync<T>(&self, unit: impl FnOnce() -> T) -> T {
        self.run_with_checking_sync(false, unit)
    }

    /// Runs `unit` with scoping forced on or off.
    pub async fn run_with_scoping<F: Future>(&self, enabled: bool, unit: F) -> F::Output {
        let flow = self.next_flow(|o| o.scoping = Some(enabled));
        FLOW.scope(flow, unit).await
    }

    pub fn run_with_scoping_sync<T>(&self, enabled: bool, unit: impl FnOnce() -> T) -> T {
        let flow = self.next_flow(|o| o.scoping = Some(enabled));
        FLOW.sync_scope(flow, unit)
    }

    /// The principal checks are made for: a `run_as` override, then the
    /// principal set with [`set_current_principal`](Self::set_current_principal),
    /// then the provider.
    #[must_use]
    pub fn current_principal(&self) -> Principal {
        if let Some(principal) = self.overrides().principal {
            return principal;
        }
        if let Some(principal) = self.pinned.load_full() {
            return Principal::clone(&principal);
        }
        self.provider.current_principal()
    }

    /// Pins a principal for every flow until cleared.
    pub fn set_current_principal(&self, principal: Principal) {
        self.pinned.store(Some(Arc::new(principal)));
    }

    pub fn clear_current_principal(&self) {
        self.pinned.store(None);
    }

    /// Runs `unit` as `principal`.
    pub async fn run_as<F: Future>(&self, principal: Principal, unit: F) -> F::Output {
        let flow = self.next_flow(|o| o.principal = Some(principal));
        FLOW.scope(flow, unit).await
    }

    pub fn run_as_sync<T>(&self, principal: Principal, unit: impl FnOnce() -> T) -> T {
        let flow = self.next_flow(|o| o.principal = Some(principal));
        FLOW.sync_scope(flow, unit)
    }

    fn overrides(&self) -> Overrides {
        FLOW.try_with(|flow| flow.get(&self.id).cloned())
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn next_flow(&self, edit: impl FnOnce(&mut Overrides)) -> FlowOverrides {
        let mut flow = FLOW.try_with(Clone::clone).unwrap_or_default();
        edit(flow.entry(self.id).or_default());
        flow
    }
}

impl fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("id", &self.id)
            .field("checking_default", &self.checking_default)
            .field("scoping_default", &self.scoping_default)
            .field("pinned", &self.pinned.load().is_some())
            .finish_non_exhaustive()
    }
}
