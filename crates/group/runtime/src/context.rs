use chrono::{DateTime, Utc};
use group_types::{checked_add_duration, GroupResult};
use std::time::Duration;

/// The block an operation executes in. All deadlines are measured against
/// `time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    pub time: DateTime<Utc>,
}

impl BlockContext {
    pub fn new(height: u64, time: DateTime<Utc>) -> Self {
        Self { height, time }
    }

    /// The following block, `elapsed` later.
    pub fn next_block(&self, elapsed: Duration) -> GroupResult<Self> {
        Ok(Self {
            height: self.height + 1,
            time: checked_add_duration(self.time, elapsed)?,
        })
    }
}
