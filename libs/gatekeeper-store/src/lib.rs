#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Permission-aware fetching and writing for `gatekeeper`.
//!
//! - [`EntityStore`] - port implemented by the host's storage layer
//! - [`SecureStore`] - wraps a store: reads are filtered or raise, writes
//!   pass the create/update/destroy checkpoints
//! - [`Include`], [`Loaded`] - eager-include requests and the trees they load
//! - [`filter_readable`] - the read policy applied to already-loaded data
//!
//! ## Usage
//!
//! ```ignore
//! let store = SecureStore::new(repo, gatekeeper.clone());
//!
//! let include = Include::none().with("pages", Include::none().relation("margin_notes"));
//! let notebooks = gatekeeper
//!     .context()
//!     .run_with_scoping(true, store.find_all("notebook", &criteria, &include))
//!     .await?;
//! ```

pub mod error;
pub mod filter;
pub mod include;
pub mod loaded;
pub mod secure;
pub mod store;

pub use error::SecureStoreError;
pub use filter::{filter_readable, filter_readable_one};
pub use include::Include;
pub use loaded::{Loaded, LoadedRelation};
pub use secure::SecureStore;
pub use store::EntityStore;
