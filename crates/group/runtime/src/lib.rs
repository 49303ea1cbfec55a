//! # Group Runtime
//!
//! The governance engine. [`GroupKeeper`] owns a [`GroupStore`] and an
//! [`ActionRouter`] and exposes every state transition of the group
//! lifecycle:
//!
//! - group administration: create, update members, admin and metadata,
//!   leave
//! - group policy administration: create policy accounts, update their
//!   admin, decision policy and metadata
//! - proposals: submit, withdraw, vote, execute
//! - the end-of-block sweep that closes expired proposals and prunes old
//!   ones
//! - genesis export and import of the whole state
//!
//! Every operation runs against a branch of the store and router. The
//! branch is committed only when the operation succeeds, with one
//! exception: when a proposal is found to be stale its abort is committed
//! and the operation still returns [`GroupError::Modified`].
//!
//! [`GroupStore`]: group_store::GroupStore
//! [`GroupError::Modified`]: group_types::GroupError::Modified

#![deny(unsafe_code)]

mod context;
mod executor;
mod genesis;
mod groups;
mod invariants;
mod keeper;
mod msgs;
mod policies;
mod proposals;
mod queries;
mod router;
mod sweep;
mod tally;
mod validation;

pub use context::BlockContext;
pub use executor::Executor;
pub use invariants::{
    ClosedProposalVotesPrunedInvariant, GroupTotalWeightInvariant, Invariant, InvariantEnforcer,
    InvariantViolation, PinnedVersionsInvariant, TallyVotesSumInvariant,
    TallyWithinTotalWeightInvariant,
};
pub use keeper::GroupKeeper;
pub use msgs::*;
pub use policies::derive_policy_address;
pub use router::{ActionError, ActionRouter};
pub use sweep::SweepSummary;
pub use tally::tally_proposal;
