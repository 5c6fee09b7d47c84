//! Read-policy filtering of loaded trees.
//!
//! In scoping mode unreadable entities are dropped from collections and
//! unreadable scalar associations are hidden; otherwise the first
//! unreadable entity raises. Nothing is ever written back to the store.

use std::mem;

use gatekeeper::{
    GateKeeper, PermissionAction, PermissionError, PermissionSubject, Principal, Subject,
};

use crate::loaded::{Loaded, LoadedRelation};

/// Applies the read policy to `items` and everything loaded beneath them.
///
/// Uses the current principal and scoping mode of `gatekeeper`'s context.
///
/// # Errors
///
/// [`PermissionError`] for the first unreadable entity when scoping is off.
pub fn filter_readable(
    gatekeeper: &GateKeeper,
    items: Vec<Loaded>,
) -> Result<Vec<Loaded>, PermissionError> {
    ReadFilter::new(gatekeeper).collection(items)
}

/// Single-result form of [`filter_readable`]: an unreadable entity becomes
/// `None` in scoping mode.
///
/// # Errors
///
/// [`PermissionError`] when the entity, or anything loaded beneath it, is
/// unreadable and scoping is off.
pub fn filter_readable_one(
    gatekeeper: &GateKeeper,
    item: Loaded,
) -> Result<Option<Loaded>, PermissionError> {
    ReadFilter::new(gatekeeper).single(item)
}

struct ReadFilter<'a> {
    gatekeeper: &'a GateKeeper,
    principal: Principal,
    scoping: bool,
}

impl<'a> ReadFilter<'a> {
    fn new(gatekeeper: &'a GateKeeper) -> Self {
        let context = gatekeeper.context();
        Self {
            gatekeeper,
            principal: context.current_principal(),
            scoping: context.is_scoping_enabled(),
        }
    }

    fn single(&self, mut item: Loaded) -> Result<Option<Loaded>, PermissionError> {
        let readable = self.gatekeeper.authorize(
            Subject::Instance(item.entity()),
            PermissionAction::Read,
            &self.principal,
        );
        if !readable {
            if self.scoping {
                tracing::debug!(entity = %item.entity().describe(), "unreadable entity hidden");
                return Ok(None);
            }
            return Err(PermissionError::new(
                PermissionAction::Read,
                PermissionSubject::Instance(item.into_entity()),
                self.principal.clone(),
            ));
        }

        for relation in item.associations.values_mut() {
            *relation = match mem::replace(relation, LoadedRelation::One(None)) {
                LoadedRelation::One(None) => LoadedRelation::One(None),
                LoadedRelation::One(Some(related)) => {
                    LoadedRelation::One(self.single(*related)?.map(Box::new))
                }
                LoadedRelation::Many(related) => LoadedRelation::Many(self.collection(related)?),
            };
        }
        Ok(Some(item))
    }

    fn collection(&self, items: Vec<Loaded>) -> Result<Vec<Loaded>, PermissionError> {
        items
            .into_iter()
            .filter_map(|item| self.single(item).transpose())
            .collect()
    }
}
