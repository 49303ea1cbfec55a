//! Vote options and weighted tallies

use crate::{GroupError, GroupResult};
use group_math::Dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A voter's choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Yes,
    No,
    Abstain,
    NoWithVeto,
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VoteOption::Yes => "yes",
            VoteOption::No => "no",
            VoteOption::Abstain => "abstain",
            VoteOption::NoWithVeto => "no_with_veto",
        };
        f.write_str(s)
    }
}

impl FromStr for VoteOption {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" | "vote_option_yes" => Ok(VoteOption::Yes),
            "no" | "vote_option_no" => Ok(VoteOption::No),
            "abstain" | "vote_option_abstain" => Ok(VoteOption::Abstain),
            "no_with_veto" | "vote_option_no_with_veto" => Ok(VoteOption::NoWithVeto),
            _ => Err(GroupError::Invalid(format!("vote option {s:?}"))),
        }
    }
}

/// Per-option sums of voter weights.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes_count: Dec,
    pub no_count: Dec,
    pub abstain_count: Dec,
    pub no_with_veto_count: Dec,
}

impl TallyResult {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add `weight` to the bucket for `option`.
    pub fn add(&mut self, option: VoteOption, weight: Dec) -> GroupResult<()> {
        let bucket = match option {
            VoteOption::Yes => &mut self.yes_count,
            VoteOption::No => &mut self.no_count,
            VoteOption::Abstain => &mut self.abstain_count,
            VoteOption::NoWithVeto => &mut self.no_with_veto_count,
        };
        *bucket = bucket.checked_add(weight)?;
        Ok(())
    }

    pub fn count(&self, option: VoteOption) -> Dec {
        match option {
            VoteOption::Yes => self.yes_count,
            VoteOption::No => self.no_count,
            VoteOption::Abstain => self.abstain_count,
            VoteOption::NoWithVeto => self.no_with_veto_count,
        }
    }

    /// Weight that has voted at all.
    pub fn total_counts(&self) -> GroupResult<Dec> {
        let total = self
            .yes_count
            .checked_add(self.no_count)?
            .checked_add(self.abstain_count)?
            .checked_add(self.no_with_veto_count)?;
        Ok(total)
    }
}
