use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// User-assigned priority marker on a location section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Highlight {
    Avoid,
    #[default]
    None,
    NoPriority,
    Unspecified,
    Priority,
}

impl Highlight {
    /// Integer code used in persisted state.
    pub fn code(self) -> i64 {
        match self {
            Highlight::Avoid => -1,
            Highlight::None => 0,
            Highlight::NoPriority => 1,
            Highlight::Unspecified => 2,
            Highlight::Priority => 3,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Highlight::Avoid,
            1 => Highlight::NoPriority,
            2 => Highlight::Unspecified,
            3 => Highlight::Priority,
            _ => Highlight::None,
        }
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Highlight::Avoid => write!(f, "avoid"),
            Highlight::None => write!(f, "none"),
            Highlight::NoPriority => write!(f, "no_priority"),
            Highlight::Unspecified => write!(f, "unspecified"),
            Highlight::Priority => write!(f, "priority"),
        }
    }
}

impl FromStr for Highlight {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "avoid" => Ok(Highlight::Avoid),
            "" | "none" => Ok(Highlight::None),
            "no_priority" => Ok(Highlight::NoPriority),
            "unspecified" => Ok(Highlight::Unspecified),
            "priority" => Ok(Highlight::Priority),
            other => Err(format!("unknown highlight: '{}'", other)),
        }
    }
}
