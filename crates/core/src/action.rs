use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user action applied to an item. The first five map 1:1 to mouse
/// buttons; `Single` is the single-button cycling control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Primary,
    Secondary,
    Toggle,
    Prev,
    Next,
    Single,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Primary => write!(f, "primary"),
            Action::Secondary => write!(f, "secondary"),
            Action::Toggle => write!(f, "toggle"),
            Action::Prev => write!(f, "prev"),
            Action::Next => write!(f, "next"),
            Action::Single => write!(f, "single"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" | "left" => Ok(Action::Primary),
            "secondary" | "right" => Ok(Action::Secondary),
            "toggle" | "middle" => Ok(Action::Toggle),
            "prev" | "back" => Ok(Action::Prev),
            "next" | "forward" => Ok(Action::Next),
            "single" => Ok(Action::Single),
            other => Err(format!("unknown action: '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_mouse_aliases() {
        assert_eq!("primary".parse::<Action>(), Ok(Action::Primary));
        assert_eq!("Right".parse::<Action>(), Ok(Action::Secondary));
        assert_eq!("middle".parse::<Action>(), Ok(Action::Toggle));
        assert_eq!("single".parse::<Action>(), Ok(Action::Single));
        assert!("double".parse::<Action>().is_err());
    }
}
