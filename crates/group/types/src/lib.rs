//! # Group Types
//!
//! Domain types for weighted multi-party governance.
//!
//! A *group* is a set of member addresses with decimal voting weights. A
//! group owns any number of *group policies*, each an account with its own
//! address and a [`DecisionPolicy`] that turns a weighted tally into a
//! decision. Members submit *proposals* against a policy, vote on them, and
//! accepted proposals execute their actions under the policy's authority.
//!
//! # Key Concepts
//!
//! - **Versioning**: groups and policies carry a version counter. A proposal
//!   pins both versions at submission and is aborted if either moves.
//! - **Decision policies**: [`ThresholdDecisionPolicy`] compares raw yes
//!   weight, [`PercentageDecisionPolicy`] compares yes weight as a share of
//!   the group's total weight.
//! - **Tallies**: [`TallyResult`] holds per-option weight sums. Once a
//!   proposal closes its final tally is frozen and votes are pruned.

#![deny(unsafe_code)]

mod action;
mod address;
mod config;
mod error;
mod event;
mod genesis;
mod group;
mod ids;
mod member;
mod policy;
mod proposal;
mod tally;
mod time;

pub use action::*;
pub use address::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use genesis::*;
pub use group::*;
pub use ids::*;
pub use member::*;
pub use policy::*;
pub use proposal::*;
pub use tally::*;
pub use time::*;

pub use group_math::{Dec, MathError, MathResult};
