use crate::{GroupError, GroupResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An account address: a member, an admin, or a group policy account.
///
/// Addresses are opaque to the engine. They must be non-empty, at most
/// [`Address::MAX_LEN`] bytes, and made of ASCII alphanumerics plus
/// `-`, `_`, `.` and `:`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const MAX_LEN: usize = 255;

    pub fn new(value: impl Into<String>) -> GroupResult<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(GroupError::Empty("address"));
        }
        if value.len() > Self::MAX_LEN {
            return Err(GroupError::TooLong {
                field: "address",
                len: value.len(),
                max: Self::MAX_LEN,
            });
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        {
            return Err(GroupError::Invalid(format!(
                "address {value:?}: unexpected character {c:?}"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::new(s)
    }
}

impl TryFrom<String> for Address {
    type Error = GroupError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl TryFrom<&str> for Address {
    type Error = GroupError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Address::new(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}
