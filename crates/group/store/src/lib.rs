//! Storage for groups, members, policies, proposals and votes.
//!
//! [`GroupStore`] is the seam between the governance engine and its state.
//! Every table is keyed by its primary key and kept alongside secondary
//! indexes keyed by `(secondary key, primary key)`, so range reads by
//! admin, member, policy or voter are ordered and stable.

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryGroupStore;
pub use traits::{GroupStore, QueryWindow, Sequences};
