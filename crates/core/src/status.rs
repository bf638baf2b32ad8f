//! Tri-state availability of a monitored target.

use std::fmt;

use serde::Serialize;

/// Availability of a target as last observed by its unit.
///
/// `Unknown` only exists before the first completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Unknown,
    Up,
    Down,
}

impl Status {
    /// Whether the target is known to be up.
    pub fn is_up(self) -> bool {
        self == Status::Up
    }
}

impl From<bool> for Status {
    fn from(reachable: bool) -> Self {
        if reachable {
            Status::Up
        } else {
            Status::Down
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unknown => "unknown",
            Status::Up => "up",
            Status::Down => "down",
        };
        f.write_str(s)
    }
}
