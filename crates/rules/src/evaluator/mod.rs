//! Rule evaluation.
//!
//! Turns a [`RuleSet`] into an [`AccessibilityLevel`]:
//! - alternatives are OR'ed, the first fully `Normal` one wins
//! - tokens inside an alternative are AND'ed; `[optional]` misses
//!   downgrade to `SequenceBreak`, `{inspect}` tokens cap at `Inspect`;
//!   an `Inspect` result outside braces is a miss
//! - `@` references recurse into other locations/sections, cut off once the
//!   target is already being evaluated `max_repeats` times, including
//!   through script callbacks that query back into the tracker
//!
//! Nothing in here fails: bad tokens, missing references, recursion and
//! host errors all degrade to `None`/`0` with a warning.

mod cache;
mod path;

pub use cache::LogicCache;
pub use path::PathStack;

use tracing::warn;
use tracklogic_core::AccessibilityLevel;

use crate::item::Item;
use crate::location::{LocationGraph, RefTarget};
use crate::rule::{RuleSet, Target, Token};
use crate::script::{ScriptHost, ScriptValue};

/// A level plus whether it may be memoized. Results that depend on a
/// recursion cut-off are path-dependent and must not be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub level: AccessibilityLevel,
    pub cacheable: bool,
}

impl Resolution {
    fn settled(level: AccessibilityLevel) -> Self {
        Self {
            level,
            cacheable: true,
        }
    }

    fn cut() -> Self {
        Self {
            level: AccessibilityLevel::None,
            cacheable: false,
        }
    }
}

/// Cache/path key for a reference target.
pub fn target_key(target: RefTarget<'_>) -> String {
    match target {
        RefTarget::Location(l) => format!("loc:{}", l.id()),
        RefTarget::Section(s) => format!("sec:{}", s.full_id()),
    }
}

fn count_level(satisfied: bool) -> AccessibilityLevel {
    if satisfied {
        AccessibilityLevel::Normal
    } else {
        AccessibilityLevel::None
    }
}

/// Borrowed view over everything a query reads.
pub struct Evaluator<'a> {
    items: &'a [Item],
    graph: &'a LocationGraph,
    cache: &'a LogicCache,
    host: &'a dyn ScriptHost,
    max_repeats: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        items: &'a [Item],
        graph: &'a LocationGraph,
        cache: &'a LogicCache,
        host: &'a dyn ScriptHost,
        max_repeats: usize,
    ) -> Self {
        Self {
            items,
            graph,
            cache,
            host,
            max_repeats: max_repeats.max(1),
        }
    }

    // ── Rule-sets ───────────────────────────────────────────────────

    pub fn evaluate(&self, rules: &RuleSet, visibility: bool, path: &PathStack) -> Resolution {
        use AccessibilityLevel as L;

        if rules.is_empty() {
            return Resolution::settled(L::Normal);
        }

        let mut glitched = false;
        let mut inspectable = false;
        let mut cacheable = true;

        for alternative in rules.alternatives() {
            if alternative.is_empty() {
                return Resolution::settled(L::Normal);
            }

            let mut result = L::Normal;
            let mut inspect_only = false;

            for raw in alternative {
                if raw.is_empty() {
                    continue;
                }
                let token = match Token::parse(raw) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(token = %raw, error = %e, "malformed rule token");
                        result = L::None;
                        break;
                    }
                };

                if token.inspect {
                    inspect_only = true;
                    if token.target == Target::Empty {
                        inspectable = true;
                        continue;
                    }
                }

                let sub = self.resolve_token(&token, visibility, path);
                cacheable &= sub.cacheable;
                // Inspect results only count inside `{...}`.
                let level = match sub.level {
                    L::Inspect if !token.inspect => L::None,
                    level => level,
                };
                match level {
                    L::Normal | L::Cleared | L::Inspect => {}
                    L::SequenceBreak => {
                        if result == L::Normal {
                            result = L::SequenceBreak;
                        }
                    }
                    L::None if token.optional => {
                        if result == L::Normal {
                            result = L::SequenceBreak;
                        }
                    }
                    L::None => {
                        result = L::None;
                        break;
                    }
                }
            }

            // A full match is correct whatever was cut elsewhere.
            if result == L::Normal && !inspect_only {
                return Resolution::settled(L::Normal);
            }
            if result != L::None && inspect_only {
                inspectable = true;
            }
            if result == L::SequenceBreak {
                glitched = true;
            }
        }

        let level = if glitched {
            L::SequenceBreak
        } else if inspectable {
            L::Inspect
        } else {
            L::None
        };
        Resolution { level, cacheable }
    }

    /// Evaluate the rules of a location or (canonical) section.
    pub fn evaluate_target(
        &self,
        target: RefTarget<'_>,
        visibility: bool,
        path: &PathStack,
    ) -> Resolution {
        let rules = match target {
            RefTarget::Location(l) if visibility => l.visibility_rules(),
            RefTarget::Location(l) => l.access_rules(),
            RefTarget::Section(s) => {
                let canonical = self.graph.canonical(s);
                if visibility {
                    canonical.visibility_rules()
                } else {
                    canonical.access_rules()
                }
            }
        };
        self.evaluate(rules, visibility, path)
    }

    // ── Tokens ──────────────────────────────────────────────────────

    fn resolve_token(&self, token: &Token<'_>, visibility: bool, path: &PathStack) -> Resolution {
        match &token.target {
            Target::Empty => Resolution::settled(AccessibilityLevel::Normal),
            Target::Reference(reference) => self.resolve_reference(reference, visibility, path),
            Target::Code(code) => {
                let n = self.provider_count(code);
                Resolution::settled(if token.level {
                    AccessibilityLevel::from_code(i64::from(n))
                } else {
                    count_level(n >= token.count)
                })
            }
            Target::Script { call, .. } => {
                let key = format!("${}", call);
                if token.level {
                    self.script_level(&key)
                } else {
                    let (n, cacheable) = self.count(&key);
                    Resolution {
                        level: count_level(n >= token.count),
                        cacheable,
                    }
                }
            }
        }
    }

    fn resolve_reference(&self, reference: &str, visibility: bool, path: &PathStack) -> Resolution {
        match self.graph.resolve(reference) {
            Some(target) => self.memoized(target, visibility, path),
            None => {
                warn!(reference = %reference, "rule references unknown location");
                Resolution::settled(AccessibilityLevel::None)
            }
        }
    }

    /// Top-level query for a location or section. The target itself is the
    /// first entry on the reference path.
    pub fn query(&self, target: RefTarget<'_>, visibility: bool) -> Resolution {
        self.memoized(target, visibility, &PathStack::new())
    }

    fn memoized(&self, target: RefTarget<'_>, visibility: bool, path: &PathStack) -> Resolution {
        let target = match target {
            RefTarget::Section(s) => RefTarget::Section(self.graph.canonical(s)),
            t => t,
        };
        let key = target_key(target);

        if !visibility {
            if let Some(level) = self.cache.reference(&key) {
                return Resolution::settled(level);
            }
        }
        // A host callback that re-enters the tracker starts from an empty
        // path; the in-flight count still sees the outer chain.
        let seen = path.count(&key).max(self.cache.active(&key));
        if seen >= self.max_repeats {
            warn!(reference = %key, depth = path.depth(), seen, "rule recursion detected");
            self.cache.note_cut();
            return Resolution::cut();
        }

        self.cache.enter(&key);
        let res = self.evaluate_target(target, visibility, &path.push(&key));
        self.cache.leave(&key);
        if !visibility && res.cacheable {
            self.cache.store_reference(key, res.level);
        }
        res
    }

    // ── Provider counts ─────────────────────────────────────────────

    /// Units of `code` currently available. `$func|a|b` codes call the
    /// scripting host; anything else sums over all items.
    pub fn provider_count(&self, code: &str) -> i32 {
        self.count(code).0
    }

    /// Provider count plus whether it may be memoized. A script call that
    /// hit a recursion cut-off (through a host re-entering the tracker)
    /// is path-dependent and stays out of the cache.
    fn count(&self, code: &str) -> (i32, bool) {
        if let Some(n) = self.cache.provider_count(code) {
            return (n, true);
        }
        let (n, cacheable) = match code.strip_prefix('$') {
            Some(call) => {
                let cuts = self.cache.cuts();
                let n = self.call_script(call).map(|v| v.as_count()).unwrap_or(0);
                (n, self.cache.cuts() == cuts)
            }
            None => (self.items.iter().map(|i| i.provides_code(code)).sum(), true),
        };
        if cacheable {
            self.cache.store_provider_count(code, n);
        }
        (n, cacheable)
    }

    /// `^$func`: the host returns a level (or a bool) instead of a count.
    fn script_level(&self, key: &str) -> Resolution {
        let cache_key = format!("^{}", key);
        if let Some(code) = self.cache.provider_count(&cache_key) {
            return Resolution::settled(AccessibilityLevel::from_code(i64::from(code)));
        }
        let call = key.strip_prefix('$').unwrap_or(key);
        let cuts = self.cache.cuts();
        let level = match self.call_script(call) {
            Some(ScriptValue::Bool(b)) => count_level(b),
            Some(v) => AccessibilityLevel::from_code(i64::from(v.as_count())),
            None => AccessibilityLevel::None,
        };
        let cacheable = self.cache.cuts() == cuts;
        if cacheable {
            self.cache
                .store_provider_count(&cache_key, level.code() as i32);
        }
        Resolution { level, cacheable }
    }

    fn call_script(&self, call: &str) -> Option<ScriptValue> {
        let mut parts = call.split('|');
        let name = parts.next().unwrap_or_default();
        let args: Vec<String> = parts.map(str::to_string).collect();
        match self.host.call_function(name, &args) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(function = %name, error = %e, "script call failed, counting as 0");
                None
            }
        }
    }
}
