//! Rule-sets and the token grammar.
//!
//! A [`RuleSet`] is an OR-list of alternatives, each an AND-list of raw
//! token strings. Tokens stay as strings until evaluation; [`Token::parse`]
//! peels the decorations off in a fixed order:
//!
//! ```text
//! [optional]  {inspect}  inner:count  ^level  @location/section | $func|a|b | code
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Rule-set ────────────────────────────────────────────────────────

/// Normalized rule-set: outer list is OR, inner lists are AND.
///
/// An empty rule-set, or one containing an empty alternative, is always
/// satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Vec<String>>);

impl RuleSet {
    pub fn new(alternatives: Vec<Vec<String>>) -> Self {
        Self(alternatives)
    }

    /// Build from string slices, mostly for tests and hand-written packs.
    pub fn from_strs(alternatives: &[&[&str]]) -> Self {
        Self(
            alternatives
                .iter()
                .map(|alt| alt.iter().map(|t| t.to_string()).collect())
                .collect(),
        )
    }

    pub fn alternatives(&self) -> &[Vec<String>] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Cross product with a parent rule-set: every parent alternative is
    /// extended by every child alternative (parent AND child).
    ///
    /// An empty parent yields the child unchanged.
    pub fn inherit(parent: &RuleSet, child: Vec<Vec<String>>) -> RuleSet {
        if parent.is_empty() {
            return RuleSet(child);
        }
        let mut out = Vec::with_capacity(parent.len() * child.len());
        for new_alt in &child {
            for old_alt in &parent.0 {
                let mut merged = old_alt.clone();
                merged.extend(new_alt.iter().cloned());
                out.push(merged);
            }
        }
        RuleSet(out)
    }
}

impl From<Vec<Vec<String>>> for RuleSet {
    fn from(v: Vec<Vec<String>>) -> Self {
        Self(v)
    }
}

// ── Token errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("empty reference target")]
    EmptyReference,

    #[error("empty script function name")]
    EmptyScriptName,

    #[error("bad count suffix '{0}'")]
    BadCount(String),
}

// ── Token ───────────────────────────────────────────────────────────

/// What a token points at once its decorations are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    /// Nothing left (`{}`, `[]`, ...). Always satisfied.
    Empty,
    /// Item code, counted through the provider-count resolver.
    Code(&'a str),
    /// `@location` or `@location/section`; the text after `@`.
    Reference(&'a str),
    /// `$name|arg|...`; `call` is the whole text after `$`.
    Script {
        call: &'a str,
        name: &'a str,
        args: Vec<&'a str>,
    },
}

/// A parsed rule token borrowing from its raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub raw: &'a str,
    pub optional: bool,
    pub inspect: bool,
    /// Required multiplicity, default 1.
    pub count: i32,
    /// `^`: the resolved value is an accessibility level, not a count.
    pub level: bool,
    pub target: Target<'a>,
}

impl<'a> Token<'a> {
    pub fn parse(raw: &'a str) -> Result<Self, TokenError> {
        let mut s = raw;

        let optional = s.len() > 1 && s.starts_with('[') && s.ends_with(']');
        if optional {
            s = &s[1..s.len() - 1];
        }

        let mut inspect = false;
        if let Some(rest) = s.strip_prefix('{') {
            inspect = true;
            s = rest;
        }
        if let Some(rest) = s.strip_suffix('}') {
            inspect = true;
            s = rest;
        }

        let mut count = 1;
        if let Some(pos) = s.rfind(':') {
            let suffix = &s[pos + 1..];
            match suffix.trim().parse::<i32>() {
                Ok(n) => {
                    count = n;
                    s = &s[..pos];
                }
                // Location names may contain ':'; only references get that leeway.
                Err(_) if s.trim_start_matches('^').starts_with('@') => {}
                Err(_) => return Err(TokenError::BadCount(suffix.to_string())),
            }
        }

        let mut level = false;
        if let Some(rest) = s.strip_prefix('^') {
            level = true;
            s = rest;
        }

        let target = if s.is_empty() {
            Target::Empty
        } else if let Some(reference) = s.strip_prefix('@') {
            if reference.is_empty() {
                return Err(TokenError::EmptyReference);
            }
            Target::Reference(reference)
        } else if let Some(call) = s.strip_prefix('$') {
            let mut parts = call.split('|');
            let name = parts.next().unwrap_or_default();
            if name.is_empty() {
                return Err(TokenError::EmptyScriptName);
            }
            Target::Script {
                call,
                name,
                args: parts.collect(),
            }
        } else {
            Target::Code(s)
        };

        Ok(Token {
            raw,
            optional,
            inspect,
            count,
            level,
            target,
        })
    }
}

/// Split a comma-separated code list, trimming whitespace and dropping
/// empty entries.
pub fn comma_split(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
