use crate::{GroupError, GroupResult};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// `time + duration`, failing instead of panicking when out of range.
pub fn checked_add_duration(time: DateTime<Utc>, duration: Duration) -> GroupResult<DateTime<Utc>> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|delta| time.checked_add_signed(delta))
        .ok_or_else(|| GroupError::Invalid(format!("duration {duration:?} out of range")))
}
