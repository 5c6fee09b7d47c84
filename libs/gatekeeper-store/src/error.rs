//! Errors returned by [`SecureStore`](crate::SecureStore).

use gatekeeper::PermissionError;
use thiserror::Error;

/// Either an authorization denial or a failure of the wrapped store.
#[derive(Debug, Error)]
pub enum SecureStoreError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error("entity store failed: {0}")]
    Store(#[source] E),
}

impl<E> SecureStoreError<E>
where
    E: std::error::Error + 'static,
{
    /// The denial, if this is one.
    #[must_use]
    pub fn as_permission(&self) -> Option<&PermissionError> {
        match self {
            Self::Permission(err) => Some(err),
            Self::Store(_) => None,
        }
    }
}
