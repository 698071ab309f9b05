//! On-disk rule shapes.

use serde::{Deserialize, Serialize};

use crate::rule::comma_split;

/// A rule field as packs write it.
///
/// - `"code"`: one alternative holding the whole string as a single token
/// - `["a,b", ["c", "d"]]`: one alternative per entry; string entries are
///   comma-split into tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    Single(String),
    Alternatives(Vec<AlternativeSpec>),
    Invalid(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlternativeSpec {
    Codes(String),
    Tokens(Vec<String>),
    Invalid(serde_json::Value),
}

/// Outcome of normalizing a rule field.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRules {
    /// Field absent, empty or unusable: inherit the parent's rules.
    Inherit,
    /// Own alternatives, to be crossed with the parent's.
    Own(Vec<Vec<String>>),
}

impl RuleSpec {
    /// Normalize into alternatives. Invalid entries are reported through
    /// `bad` and skipped.
    pub fn normalize(&self, mut bad: impl FnMut(&serde_json::Value)) -> NormalizedRules {
        match self {
            RuleSpec::Single(s) if s.is_empty() => NormalizedRules::Inherit,
            RuleSpec::Single(s) => NormalizedRules::Own(vec![vec![s.clone()]]),
            RuleSpec::Alternatives(alts) if alts.is_empty() => NormalizedRules::Inherit,
            RuleSpec::Alternatives(alts) => {
                let mut out = Vec::with_capacity(alts.len());
                for alt in alts {
                    match alt {
                        AlternativeSpec::Codes(s) => out.push(comma_split(s)),
                        AlternativeSpec::Tokens(tokens) => out.push(tokens.clone()),
                        AlternativeSpec::Invalid(v) => bad(v),
                    }
                }
                NormalizedRules::Own(out)
            }
            RuleSpec::Invalid(v) => {
                if !v.is_null() {
                    bad(v);
                }
                NormalizedRules::Inherit
            }
        }
    }
}
