use crate::{Address, ProposalId};
use chrono::{DateTime, Utc};
use group_math::MathError;
use thiserror::Error;

/// Result type for group operations.
pub type GroupResult<T> = Result<T, GroupError>;

/// Coarse classification of a [`GroupError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input. Nothing was read or written.
    Validation,
    /// Caller lacks the role the operation requires.
    Authorization,
    /// A referenced record does not exist.
    NotFound,
    /// The target is in the wrong lifecycle state for the operation.
    State,
    /// A proposal action failed while executing.
    Execution,
    /// The proposal's pinned group or policy version is stale. The abort
    /// transition is persisted even though the call fails.
    Consistency,
    /// The backing store failed.
    Storage,
}

/// Errors raised by group governance operations.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("empty {0}")]
    Empty(&'static str),

    #[error("invalid {0}")]
    Invalid(String),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("{field} too long: {len} > {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("decimal error: {0}")]
    Math(#[from] MathError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("expired: {0}")]
    Expired(String),

    #[error("voter {voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("proposal {proposal_id} cannot be executed before {executable_at}")]
    NotExecutableYet {
        proposal_id: ProposalId,
        executable_at: DateTime<Utc>,
    },

    #[error("action {index} failed: {reason}")]
    ActionFailed { index: usize, reason: String },

    #[error("{0} was modified after proposal submission")]
    Modified(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl GroupError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroupError::Empty(_)
            | GroupError::Invalid(_)
            | GroupError::Duplicate(_)
            | GroupError::TooLong { .. }
            | GroupError::Math(_)
            | GroupError::Config(_) => ErrorKind::Validation,
            GroupError::Unauthorized(_) => ErrorKind::Authorization,
            GroupError::NotFound(_) => ErrorKind::NotFound,
            GroupError::InvalidState(_)
            | GroupError::Expired(_)
            | GroupError::AlreadyVoted { .. }
            | GroupError::NotExecutableYet { .. } => ErrorKind::State,
            GroupError::ActionFailed { .. } => ErrorKind::Execution,
            GroupError::Modified(_) => ErrorKind::Consistency,
            GroupError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether state written before this error must still be committed.
    pub fn commits_state(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }
}
