use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Download urgency of a file or piece. Pieces take the highest priority of the
/// files they overlap, so the variants are declared in ascending order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        }
    }
}

/// The conventional signed representation: -1, 0, 1.
impl TryFrom<i8> for Priority {
    type Error = Error;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Priority::Low),
            0 => Ok(Priority::Normal),
            1 => Ok(Priority::High),
            other => Err(Error::InvalidPriority(other.to_string())),
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    /// Accepts `low`/`normal`/`high` in any case, or the signed form `-1`/`0`/`1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<i8>() {
            return Priority::try_from(value).map_err(|_| Error::InvalidPriority(s.to_owned()));
        }
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(Error::InvalidPriority(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
