use serde::{Deserialize, Serialize};

/// Result of a reachability query.
///
/// This is a closed set, not a scale: the evaluator decides how levels
/// combine. The numeric codes are the values packs and scripts exchange
/// (`^$func` tokens return them) and are kept for compatibility only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityLevel {
    #[default]
    None,
    /// Can be looked at, but not obtained.
    Inspect,
    /// Obtainable only through out-of-logic play.
    SequenceBreak,
    Normal,
    /// Section-only terminal state, derived outside the evaluator.
    Cleared,
}

impl AccessibilityLevel {
    pub fn code(self) -> i64 {
        match self {
            AccessibilityLevel::None => 0,
            AccessibilityLevel::Inspect => 3,
            AccessibilityLevel::SequenceBreak => 5,
            AccessibilityLevel::Normal => 6,
            AccessibilityLevel::Cleared => 7,
        }
    }

    /// Map a numeric code back to a level. Unknown codes are `None`.
    pub fn from_code(code: i64) -> Self {
        match code {
            3 => AccessibilityLevel::Inspect,
            5 => AccessibilityLevel::SequenceBreak,
            6 => AccessibilityLevel::Normal,
            7 => AccessibilityLevel::Cleared,
            _ => AccessibilityLevel::None,
        }
    }

    /// Anything but `None` counts as visible/reachable in some form.
    pub fn is_some(self) -> bool {
        self != AccessibilityLevel::None
    }

    /// Fully reachable (`Normal`, or `Cleared` which implies it).
    pub fn is_normal(self) -> bool {
        matches!(self, AccessibilityLevel::Normal | AccessibilityLevel::Cleared)
    }
}

impl std::fmt::Display for AccessibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessibilityLevel::None => write!(f, "none"),
            AccessibilityLevel::Inspect => write!(f, "inspect"),
            AccessibilityLevel::SequenceBreak => write!(f, "sequence_break"),
            AccessibilityLevel::Normal => write!(f, "normal"),
            AccessibilityLevel::Cleared => write!(f, "cleared"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_for_known_levels() {
        for level in [
            AccessibilityLevel::None,
            AccessibilityLevel::Inspect,
            AccessibilityLevel::SequenceBreak,
            AccessibilityLevel::Normal,
            AccessibilityLevel::Cleared,
        ] {
            assert_eq!(AccessibilityLevel::from_code(level.code()), level);
        }
    }

    #[test]
    fn unknown_codes_are_unreachable() {
        assert_eq!(AccessibilityLevel::from_code(1), AccessibilityLevel::None);
        assert_eq!(AccessibilityLevel::from_code(-4), AccessibilityLevel::None);
        assert_eq!(AccessibilityLevel::from_code(99), AccessibilityLevel::None);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&AccessibilityLevel::SequenceBreak).unwrap();
        assert_eq!(json, "\"sequence_break\"");
    }
}
