use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled key: tries `TRACKLOGIC_{PROFILE}_{KEY}` first, falls back
/// to `TRACKLOGIC_{KEY}`.
fn profiled_opt(lookup: &dyn Fn(&str) -> Option<String>, profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("TRACKLOGIC_{}_{}", profile, key);
        if let Some(v) = lookup(&prefixed) {
            return Some(v);
        }
    }
    lookup(&format!("TRACKLOGIC_{}", key))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ── Duplicate location policy ─────────────────────────────────

/// What the loader does when two locations end up with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Append the newcomer's sections to the existing location.
    #[default]
    Merge,
    /// Keep both, suffixing the newcomer's id with `[n]`.
    Rename,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Merge => write!(f, "merge"),
            DuplicatePolicy::Rename => write!(f, "rename"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(DuplicatePolicy::Merge),
            "rename" => Ok(DuplicatePolicy::Rename),
            other => Err(format!("unknown duplicate policy: '{}'", other)),
        }
    }
}

// ── Engine config ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Match item codes case-insensitively. Some packs rely on this.
    pub case_insensitive_codes: bool,
    pub duplicate_locations: DuplicatePolicy,
    /// A reference hop is cut (evaluates to `None`) once its target
    /// already appears this many times on the current path.
    pub max_reference_repeats: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            case_insensitive_codes: true,
            duplicate_locations: DuplicatePolicy::Merge,
            max_reference_repeats: 2,
        }
    }
}

impl EngineConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TRACKLOGIC_PROFILE`.
    pub fn from_env() -> Self {
        let profile = env_or("TRACKLOGIC_PROFILE", "").to_uppercase();
        Self::from_lookup(&profile, &|key| env_opt(key))
    }

    /// Build config from an arbitrary key lookup, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup(profile: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let p = profile.to_uppercase();
        let defaults = Self::default();
        let get = |key: &str| profiled_opt(lookup, &p, key);

        Self {
            case_insensitive_codes: get("CASE_INSENSITIVE_CODES")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.case_insensitive_codes),
            duplicate_locations: get("DUPLICATE_LOCATIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.duplicate_locations),
            max_reference_repeats: get("MAX_REFERENCE_REPEATS")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_reference_repeats),
            profile: p,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Engine config loaded (profile: {}):", self.profile_label());
        tracing::info!("  codes:       case_insensitive={}", self.case_insensitive_codes);
        tracing::info!("  locations:   duplicates={}", self.duplicate_locations);
        tracing::info!("  references:  max_repeats={}", self.max_reference_repeats);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = EngineConfig::from_lookup("", &lookup_from(&[]));
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn reads_unprefixed_keys() {
        let lookup = lookup_from(&[
            ("TRACKLOGIC_CASE_INSENSITIVE_CODES", "false"),
            ("TRACKLOGIC_DUPLICATE_LOCATIONS", "rename"),
            ("TRACKLOGIC_MAX_REFERENCE_REPEATS", "3"),
        ]);
        let config = EngineConfig::from_lookup("", &lookup);
        assert!(!config.case_insensitive_codes);
        assert_eq!(config.duplicate_locations, DuplicatePolicy::Rename);
        assert_eq!(config.max_reference_repeats, 3);
    }

    #[test]
    fn profile_keys_win_over_plain_keys() {
        let lookup = lookup_from(&[
            ("TRACKLOGIC_DUPLICATE_LOCATIONS", "merge"),
            ("TRACKLOGIC_STRICT_DUPLICATE_LOCATIONS", "rename"),
        ]);
        let config = EngineConfig::from_lookup("strict", &lookup);
        assert_eq!(config.profile, "STRICT");
        assert_eq!(config.duplicate_locations, DuplicatePolicy::Rename);
    }

    #[test]
    fn garbage_values_fall_back_to_defaults() {
        let lookup = lookup_from(&[
            ("TRACKLOGIC_CASE_INSENSITIVE_CODES", "maybe"),
            ("TRACKLOGIC_MAX_REFERENCE_REPEATS", "0"),
        ]);
        let config = EngineConfig::from_lookup("", &lookup);
        assert!(config.case_insensitive_codes);
        assert_eq!(config.max_reference_repeats, 2);
    }
}
