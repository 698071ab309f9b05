//! Locations and their sections.
//!
//! Rules stored here are already inheritance-flattened by the loader.
//! [`LocationGraph`] owns the whole set and answers id lookups.

mod graph;

pub use graph::{LocationGraph, RefTarget};

use tracklogic_core::Highlight;

use crate::events::SectionRef;
use crate::rule::RuleSet;

// ── Section ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct LocationSection {
    name: String,
    parent_id: String,
    item_count: i32,
    item_cleared: i32,
    clear_as_group: bool,
    hosted_items: Vec<String>,
    access_rules: RuleSet,
    visibility_rules: RuleSet,
    reference: Option<String>,
    highlight: Highlight,
}

impl LocationSection {
    /// A section with one item, no rules and no parent yet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent_id: String::new(),
            item_count: 1,
            item_cleared: 0,
            clear_as_group: true,
            hosted_items: Vec::new(),
            access_rules: RuleSet::default(),
            visibility_rules: RuleSet::default(),
            reference: None,
            highlight: Highlight::default(),
        }
    }

    pub fn with_item_count(mut self, n: i32) -> Self {
        self.item_count = n.max(0);
        self
    }

    pub fn with_clear_as_group(mut self, group: bool) -> Self {
        self.clear_as_group = group;
        self
    }

    pub fn with_hosted_items(mut self, codes: Vec<String>) -> Self {
        self.hosted_items = codes;
        self
    }

    pub fn with_access_rules(mut self, rules: RuleSet) -> Self {
        self.access_rules = rules;
        self
    }

    pub fn with_visibility_rules(mut self, rules: RuleSet) -> Self {
        self.visibility_rules = rules;
        self
    }

    /// Alias another section (`@loc/sec` or `loc/sec`).
    pub fn with_reference(mut self, target: &str) -> Self {
        self.reference = Some(target.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn full_id(&self) -> String {
        format!("{}/{}", self.parent_id, self.name)
    }

    pub fn section_ref(&self) -> SectionRef {
        SectionRef::new(&self.parent_id, &self.name)
    }

    pub fn item_count(&self) -> i32 {
        self.item_count
    }

    pub fn item_cleared(&self) -> i32 {
        self.item_cleared
    }

    pub fn available_count(&self) -> i32 {
        self.item_count - self.item_cleared
    }

    pub fn clear_as_group(&self) -> bool {
        self.clear_as_group
    }

    pub fn hosted_items(&self) -> &[String] {
        &self.hosted_items
    }

    pub fn access_rules(&self) -> &RuleSet {
        &self.access_rules
    }

    pub fn visibility_rules(&self) -> &RuleSet {
        &self.visibility_rules
    }

    /// Target of a `ref` alias, without the leading `@`.
    pub fn reference(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .map(|r| r.strip_prefix('@').unwrap_or(r))
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    /// Clear one item, or all of them when `all` or the section clears as
    /// a group. Returns `false` if already fully cleared.
    pub fn clear_item(&mut self, all: bool) -> bool {
        if self.item_cleared >= self.item_count {
            return false;
        }
        if all || self.clear_as_group {
            self.item_cleared = self.item_count;
        } else {
            self.item_cleared += 1;
        }
        true
    }

    pub fn unclear_item(&mut self) -> bool {
        if self.item_cleared == 0 {
            return false;
        }
        if self.clear_as_group {
            self.item_cleared = 0;
        } else {
            self.item_cleared -= 1;
        }
        true
    }

    /// Restore a saved cleared count, clamped into `[0, item_count]`.
    pub fn set_item_cleared(&mut self, n: i32) -> bool {
        let n = n.clamp(0, self.item_count);
        if n == self.item_cleared {
            return false;
        }
        self.item_cleared = n;
        true
    }

    pub fn set_highlight(&mut self, highlight: Highlight) -> bool {
        if self.highlight == highlight {
            return false;
        }
        self.highlight = highlight;
        true
    }
}

// ── Location ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    id: String,
    name: String,
    parent_id: Option<String>,
    access_rules: RuleSet,
    visibility_rules: RuleSet,
    sections: Vec<LocationSection>,
}

impl Location {
    /// The id is `parent_id/name`, or just `name` at the top level.
    pub fn new(name: &str, parent_id: Option<&str>) -> Self {
        let parent_id = parent_id.filter(|p| !p.is_empty()).map(str::to_string);
        let id = match &parent_id {
            Some(p) => format!("{}/{}", p, name),
            None => name.to_string(),
        };
        Self {
            id,
            name: name.to_string(),
            parent_id,
            access_rules: RuleSet::default(),
            visibility_rules: RuleSet::default(),
            sections: Vec::new(),
        }
    }

    pub fn with_access_rules(mut self, rules: RuleSet) -> Self {
        self.access_rules = rules;
        self
    }

    pub fn with_visibility_rules(mut self, rules: RuleSet) -> Self {
        self.visibility_rules = rules;
        self
    }

    pub fn with_section(mut self, section: LocationSection) -> Self {
        self.push_section(section);
        self
    }

    pub fn push_section(&mut self, mut section: LocationSection) {
        section.parent_id = self.id.clone();
        self.sections.push(section);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Rules used when the location itself is referenced (`@location`).
    pub fn access_rules(&self) -> &RuleSet {
        &self.access_rules
    }

    pub fn visibility_rules(&self) -> &RuleSet {
        &self.visibility_rules
    }

    pub fn sections(&self) -> &[LocationSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&LocationSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut LocationSection> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Give the location a new id, re-parenting its sections.
    pub(crate) fn rename(&mut self, id: String) {
        for section in &mut self.sections {
            section.parent_id = id.clone();
        }
        self.id = id;
    }

    /// Append another location's sections (duplicate-id merge).
    pub(crate) fn merge(&mut self, other: Location) {
        for section in other.sections {
            self.push_section(section);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_join_with_parent() {
        let loc = Location::new("Cave", Some("Overworld"))
            .with_section(LocationSection::new("Chest"));
        assert_eq!(loc.id(), "Overworld/Cave");
        assert_eq!(loc.sections()[0].full_id(), "Overworld/Cave/Chest");
        assert_eq!(Location::new("Top", None).id(), "Top");
    }

    #[test]
    fn clear_respects_grouping() {
        let mut grouped = LocationSection::new("Chests").with_item_count(3);
        assert!(grouped.clear_item(false));
        assert_eq!(grouped.item_cleared(), 3);
        assert!(!grouped.clear_item(false));
        assert!(grouped.unclear_item());
        assert_eq!(grouped.item_cleared(), 0);
        assert!(!grouped.unclear_item());

        let mut single = LocationSection::new("Chests")
            .with_item_count(3)
            .with_clear_as_group(false);
        single.clear_item(false);
        assert_eq!(single.available_count(), 2);
        single.clear_item(true);
        assert_eq!(single.available_count(), 0);
        single.unclear_item();
        assert_eq!(single.item_cleared(), 2);
    }

    #[test]
    fn restore_cleared_is_clamped() {
        let mut sec = LocationSection::new("Chest").with_item_count(2);
        assert!(sec.set_item_cleared(9));
        assert_eq!(sec.item_cleared(), 2);
        assert!(!sec.set_item_cleared(2));
    }

    #[test]
    fn reference_strips_at() {
        let sec = LocationSection::new("Alias").with_reference("@Dungeon/Boss");
        assert_eq!(sec.reference(), Some("Dungeon/Boss"));
    }

    #[test]
    fn merge_reparents_sections() {
        let mut a = Location::new("Shop", None).with_section(LocationSection::new("Left"));
        let b = Location::new("Shop", None).with_section(LocationSection::new("Right"));
        a.merge(b);
        assert_eq!(a.sections().len(), 2);
        assert_eq!(a.section("Right").unwrap().parent_id(), "Shop");
    }
}
