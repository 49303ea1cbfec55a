//! Stateless request checks shared by keeper operations.

use group_types::{Address, GroupConfig, GroupError, GroupResult};
use serde::Deserialize;
use std::collections::BTreeSet;

pub(crate) fn assert_metadata_length(
    config: &GroupConfig,
    metadata: &str,
    field: &'static str,
) -> GroupResult<()> {
    assert_length(metadata, field, config.max_metadata_len)
}

pub(crate) fn assert_length(value: &str, field: &'static str, max: usize) -> GroupResult<()> {
    if value.len() > max {
        return Err(GroupError::TooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

/// Proposers must be present and distinct.
pub(crate) fn validate_proposers(proposers: &[Address]) -> GroupResult<()> {
    if proposers.is_empty() {
        return Err(GroupError::Empty("proposers"));
    }
    let mut seen = BTreeSet::new();
    for proposer in proposers {
        if !seen.insert(proposer) {
            return Err(GroupError::Duplicate(format!("proposer {proposer}")));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct ProposalMetadata {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
}

/// When the metadata is a JSON object, its `title` and `summary` must match
/// the proposal's. Metadata in any other format is left alone.
pub(crate) fn check_proposal_metadata(metadata: &str, title: &str, summary: &str) -> GroupResult<()> {
    if metadata.is_empty() {
        return Ok(());
    }
    let Ok(parsed) = serde_json::from_str::<ProposalMetadata>(metadata) else {
        return Ok(());
    };
    if parsed.title != title {
        return Err(GroupError::Invalid(format!(
            "metadata title {:?} must equal proposal title {title:?}",
            parsed.title
        )));
    }
    if parsed.summary != summary {
        return Err(GroupError::Invalid(format!(
            "metadata summary {:?} must equal proposal summary {summary:?}",
            parsed.summary
        )));
    }
    Ok(())
}
