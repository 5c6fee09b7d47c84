//! Association chain walking.

use std::fmt;

use crate::entity::{Entity, EntityRef, Related, same_entity};

/// Relation names in resolution order: the first name is asked of the
/// instance, each following name of the previous result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationChain(Vec<String>);

impl RelationChain {
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RelationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// Outcome of walking a [`RelationChain`].
#[derive(Debug, Clone)]
pub enum Resolved {
    /// Some link in the chain was unset.
    Nothing,
    One(EntityRef),
    Many(Vec<EntityRef>),
}

impl Resolved {
    /// `true` for [`Resolved::Nothing`] and for an empty collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Nothing => true,
            Self::One(_) => false,
            Self::Many(entities) => entities.is_empty(),
        }
    }

    /// Membership for collections, equality for scalars.
    #[must_use]
    pub fn contains(&self, candidate: &dyn Entity) -> bool {
        match self {
            Self::Nothing => false,
            Self::One(entity) => same_entity(entity.as_ref(), candidate),
            Self::Many(entities) => entities
                .iter()
                .any(|entity| same_entity(entity.as_ref(), candidate)),
        }
    }

    #[must_use]
    pub fn into_entities(self) -> Vec<EntityRef> {
        match self {
            Self::Nothing => Vec::new(),
            Self::One(entity) => vec![entity],
            Self::Many(entities) => entities,
        }
    }
}

impl From<Option<Related>> for Resolved {
    fn from(related: Option<Related>) -> Self {
        match related {
            None => Self::Nothing,
            Some(Related::One(entity)) => Self::One(entity),
            Some(Related::Many(entities)) => Self::Many(entities),
        }
    }
}

/// Follows `chain` from `instance`.
///
/// An unset link anywhere short-circuits to [`Resolved::Nothing`]. When an
/// intermediate link is a collection, the rest of the chain is followed from
/// each element and the results are flattened.
#[must_use]
pub fn resolve(instance: &dyn Entity, chain: &RelationChain) -> Resolved {
    let Some((first, rest)) = chain.segments().split_first() else {
        return Resolved::Nothing;
    };

    let mut current = Resolved::from(instance.relation(first));
    for name in rest {
        current = match current {
            Resolved::Nothing => return Resolved::Nothing,
            Resolved::One(entity) => Resolved::from(entity.relation(name)),
            Resolved::Many(entities) => Resolved::Many(
                entities
                    .iter()
                    .flat_map(|entity| Resolved::from(entity.relation(name)).into_entities())
                    .collect(),
            ),
        };
    }
    current
}
