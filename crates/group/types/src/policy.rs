//! Decision policies: turning a weighted tally into a decision

use crate::{GroupConfig, GroupError, GroupInfo, GroupResult, TallyResult};
use group_math::Dec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing windows shared by every decision policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicyWindows {
    /// How long a proposal accepts votes after submission.
    pub voting_period: Duration,
    /// Minimum delay between submission and execution.
    #[serde(default)]
    pub min_execution_period: Duration,
}

impl DecisionPolicyWindows {
    pub fn new(voting_period: Duration) -> Self {
        Self {
            voting_period,
            min_execution_period: Duration::ZERO,
        }
    }

    pub fn with_min_execution_period(mut self, period: Duration) -> Self {
        self.min_execution_period = period;
        self
    }
}

/// Accept once the yes weight reaches an absolute threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdDecisionPolicy {
    pub threshold: Dec,
    pub windows: DecisionPolicyWindows,
}

/// Accept once the yes weight reaches a share of the group's total weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentageDecisionPolicy {
    /// A value in `(0, 1]`.
    pub percentage: Dec,
    pub windows: DecisionPolicyWindows,
}

/// Outcome of evaluating a tally against a policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPolicyResult {
    pub allow: bool,
    /// When set, further votes cannot change the outcome.
    #[serde(rename = "final")]
    pub is_final: bool,
}

impl DecisionPolicyResult {
    pub const ACCEPTED: Self = Self {
        allow: true,
        is_final: true,
    };
    pub const REJECTED: Self = Self {
        allow: false,
        is_final: true,
    };
    pub const UNDECIDED: Self = Self {
        allow: false,
        is_final: false,
    };
}

/// A group policy's decision rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionPolicy {
    Threshold(ThresholdDecisionPolicy),
    Percentage(PercentageDecisionPolicy),
}

impl DecisionPolicy {
    /// Threshold policy from a decimal string.
    pub fn threshold(threshold: &str, windows: DecisionPolicyWindows) -> GroupResult<Self> {
        Ok(DecisionPolicy::Threshold(ThresholdDecisionPolicy {
            threshold: Dec::parse(threshold)?,
            windows,
        }))
    }

    /// Percentage policy from a decimal string.
    pub fn percentage(percentage: &str, windows: DecisionPolicyWindows) -> GroupResult<Self> {
        Ok(DecisionPolicy::Percentage(PercentageDecisionPolicy {
            percentage: Dec::parse(percentage)?,
            windows,
        }))
    }

    pub fn windows(&self) -> &DecisionPolicyWindows {
        match self {
            DecisionPolicy::Threshold(p) => &p.windows,
            DecisionPolicy::Percentage(p) => &p.windows,
        }
    }

    pub fn voting_period(&self) -> Duration {
        self.windows().voting_period
    }

    pub fn min_execution_period(&self) -> Duration {
        self.windows().min_execution_period
    }

    /// Stateless checks.
    pub fn validate_basic(&self) -> GroupResult<()> {
        match self {
            DecisionPolicy::Threshold(p) => {
                if !p.threshold.is_positive() {
                    return Err(GroupError::Invalid(format!(
                        "threshold {} must be positive",
                        p.threshold
                    )));
                }
            }
            DecisionPolicy::Percentage(p) => {
                if !p.percentage.is_positive() || p.percentage > Dec::ONE {
                    return Err(GroupError::Invalid(format!(
                        "percentage {} must be > 0 and <= 1",
                        p.percentage
                    )));
                }
            }
        }
        if self.voting_period().is_zero() {
            return Err(GroupError::Invalid("voting period cannot be zero".into()));
        }
        Ok(())
    }

    /// Checks against the owning group and module configuration.
    ///
    /// A threshold above the group's total weight is accepted here; such a
    /// policy simply never allows a proposal.
    pub fn validate(&self, _group: &GroupInfo, config: &GroupConfig) -> GroupResult<()> {
        self.validate_basic()?;

        let windows = self.windows();
        let ceiling = windows
            .voting_period
            .checked_add(config.max_execution_period())
            .ok_or_else(|| GroupError::Invalid("voting period out of range".into()))?;
        if windows.min_execution_period > ceiling {
            return Err(GroupError::Invalid(format!(
                "min execution period {:?} exceeds voting period plus max execution period {:?}",
                windows.min_execution_period, ceiling
            )));
        }
        Ok(())
    }

    /// Decide a tally against the group's current total weight.
    pub fn allow(&self, tally: &TallyResult, total_weight: Dec) -> GroupResult<DecisionPolicyResult> {
        match self {
            DecisionPolicy::Threshold(p) => threshold_allow(p.threshold, tally, total_weight),
            DecisionPolicy::Percentage(p) => percentage_allow(p.percentage, tally, total_weight),
        }
    }
}

fn undecided_weight(tally: &TallyResult, total_weight: Dec) -> GroupResult<Dec> {
    Ok(total_weight.sub_non_negative(tally.total_counts()?)?)
}

fn threshold_allow(
    threshold: Dec,
    tally: &TallyResult,
    total_weight: Dec,
) -> GroupResult<DecisionPolicyResult> {
    if tally.yes_count >= threshold {
        return Ok(DecisionPolicyResult::ACCEPTED);
    }

    let undecided = undecided_weight(tally, total_weight)?;
    if tally.yes_count.checked_add(undecided)? < threshold {
        return Ok(DecisionPolicyResult::REJECTED);
    }

    Ok(DecisionPolicyResult::UNDECIDED)
}

fn percentage_allow(
    percentage: Dec,
    tally: &TallyResult,
    total_weight: Dec,
) -> GroupResult<DecisionPolicyResult> {
    // An empty group can never reach any share.
    if total_weight.is_zero() {
        return Ok(DecisionPolicyResult::REJECTED);
    }

    let yes_share = tally.yes_count.checked_div(total_weight)?;
    if yes_share >= percentage {
        return Ok(DecisionPolicyResult::ACCEPTED);
    }

    let undecided = undecided_weight(tally, total_weight)?;
    let best_share = tally
        .yes_count
        .checked_add(undecided)?
        .checked_div(total_weight)?;
    if best_share < percentage {
        return Ok(DecisionPolicyResult::REJECTED);
    }

    Ok(DecisionPolicyResult::UNDECIDED)
}
