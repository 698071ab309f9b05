//! Location lookup and `ref` alias bookkeeping.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};
use tracklogic_core::DuplicatePolicy;

use super::{Location, LocationSection};
use crate::events::SectionRef;

/// What an `@` reference resolved to.
#[derive(Debug, Clone, Copy)]
pub enum RefTarget<'a> {
    Location(&'a Location),
    Section(&'a LocationSection),
}

/// All locations in declaration order, plus the section alias maps.
#[derive(Debug, Default)]
pub struct LocationGraph {
    locations: IndexMap<String, Location>,
    /// Alias section full id -> raw `ref` target.
    section_refs: IndexMap<String, String>,
    /// Canonical section full id -> alias full ids. Rebuilt on demand.
    reverse_refs: RefCell<HashMap<String, Vec<String>>>,
}

impl LocationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Insert a location, applying `policy` on id collisions. Returns the
    /// id the location ended up under.
    pub fn insert(&mut self, mut location: Location, policy: DuplicatePolicy) -> String {
        let mut id = location.id().to_string();
        if self.locations.contains_key(&id) {
            match policy {
                DuplicatePolicy::Merge => {
                    debug!(location = %id, "merging duplicate location");
                    self.index_refs(&location);
                    if let Some(existing) = self.locations.get_mut(&id) {
                        existing.merge(location);
                    }
                    return id;
                }
                DuplicatePolicy::Rename => {
                    let base = id.clone();
                    let mut n = 2;
                    while self.locations.contains_key(&id) {
                        id = format!("{}[{}]", base, n);
                        n += 1;
                    }
                    warn!(location = %base, renamed = %id, "duplicate location id renamed");
                    location.rename(id.clone());
                }
            }
        }
        self.index_refs(&location);
        self.locations.insert(id.clone(), location);
        id
    }

    fn index_refs(&mut self, location: &Location) {
        for section in location.sections() {
            if let Some(target) = section.reference() {
                self.section_refs
                    .insert(section.full_id(), target.to_string());
            }
        }
        self.reverse_refs.borrow_mut().clear();
    }

    pub fn clear(&mut self) {
        self.locations.clear();
        self.section_refs.clear();
        self.reverse_refs.borrow_mut().clear();
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Exact id first; with `partial`, then a bare name match, then a
    /// suffix match on a `/` boundary. Ties go to declaration order.
    pub fn find_location(&self, id: &str, partial: bool) -> Option<&Location> {
        if let Some(loc) = self.locations.get(id) {
            return Some(loc);
        }
        if !partial {
            return None;
        }
        self.locations
            .values()
            .find(|l| l.name() == id)
            .or_else(|| {
                let suffix = format!("/{}", id);
                self.locations.values().find(|l| l.id().ends_with(&suffix))
            })
    }

    fn find_location_index(&self, id: &str) -> Option<usize> {
        let loc = self.find_location(id, true)?;
        self.locations.get_index_of(loc.id())
    }

    pub fn find_section(&self, location_id: &str, name: &str) -> Option<&LocationSection> {
        self.find_location(location_id, true)?.section(name)
    }

    pub fn find_section_mut(
        &mut self,
        location_id: &str,
        name: &str,
    ) -> Option<&mut LocationSection> {
        let idx = self.find_location_index(location_id)?;
        self.locations.get_index_mut(idx)?.1.section_mut(name)
    }

    /// Resolve an `@` reference path. `loc/sec` is tried as a section
    /// first (split at the last `/`), then the whole path as a location.
    pub fn resolve(&self, path: &str) -> Option<RefTarget<'_>> {
        if let Some((loc, sec)) = path.rsplit_once('/') {
            if let Some(section) = self.find_section(loc, sec) {
                return Some(RefTarget::Section(section));
            }
        }
        self.find_location(path, true).map(RefTarget::Location)
    }

    /// Section whose rules apply to `section`: its `ref` target if it has
    /// one (exactly one hop), otherwise itself.
    pub fn canonical<'a>(&'a self, section: &'a LocationSection) -> &'a LocationSection {
        let Some(target) = section.reference() else {
            return section;
        };
        let resolved = target
            .rsplit_once('/')
            .and_then(|(loc, sec)| self.find_section(loc, sec));
        match resolved {
            Some(canonical) => {
                if canonical.reference().is_some() {
                    warn!(
                        section = %section.full_id(),
                        canonical = %canonical.full_id(),
                        "section ref points at another ref, not following further"
                    );
                }
                canonical
            }
            None => {
                warn!(section = %section.full_id(), reference = %target, "section ref target not found");
                section
            }
        }
    }

    /// Sections that alias `section` through `ref`.
    pub fn referencing_sections(&self, section: &SectionRef) -> Vec<SectionRef> {
        if self.reverse_refs.borrow().is_empty() && !self.section_refs.is_empty() {
            self.rebuild_reverse_refs();
        }
        self.reverse_refs
            .borrow()
            .get(&section.full_id())
            .map(|aliases| aliases.iter().filter_map(|a| SectionRef::parse(a)).collect())
            .unwrap_or_default()
    }

    fn rebuild_reverse_refs(&self) {
        let mut reverse: HashMap<String, Vec<String>> = HashMap::new();
        for (alias, target) in &self.section_refs {
            let canonical = target
                .rsplit_once('/')
                .and_then(|(loc, sec)| self.find_section(loc, sec))
                .map(LocationSection::full_id)
                .unwrap_or_else(|| target.clone());
            reverse.entry(canonical).or_default().push(alias.clone());
        }
        debug!(entries = reverse.len(), "rebuilt section reverse-ref index");
        *self.reverse_refs.borrow_mut() = reverse;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleSet;

    fn graph() -> LocationGraph {
        let mut g = LocationGraph::new();
        for loc in [
            Location::new("Overworld", None),
            Location::new("Cave", Some("Overworld"))
                .with_section(LocationSection::new("Chest").with_access_rules(RuleSet::from_strs(&[&["lamp"]]))),
            Location::new("Ice Cave", Some("Overworld"))
                .with_section(LocationSection::new("Chest")),
            Location::new("Shop", None).with_section(
                LocationSection::new("Alias")
                    .with_item_count(0)
                    .with_reference("@Overworld/Cave/Chest"),
            ),
        ] {
            g.insert(loc, DuplicatePolicy::Merge);
        }
        g
    }

    #[test]
    fn find_exact_name_then_suffix() {
        let g = graph();
        assert_eq!(g.find_location("Overworld/Cave", false).unwrap().id(), "Overworld/Cave");
        assert!(g.find_location("Cave", false).is_none());
        assert_eq!(g.find_location("Cave", true).unwrap().id(), "Overworld/Cave");
        // Suffix only matches on a segment boundary.
        assert!(g.find_location("ve", true).is_none());
        assert!(g.find_location("Nowhere", true).is_none());
    }

    #[test]
    fn resolve_prefers_sections() {
        let g = graph();
        match g.resolve("Overworld/Cave/Chest") {
            Some(RefTarget::Section(s)) => assert_eq!(s.full_id(), "Overworld/Cave/Chest"),
            other => panic!("expected section, got {:?}", other),
        }
        match g.resolve("Overworld/Cave") {
            Some(RefTarget::Location(l)) => assert_eq!(l.id(), "Overworld/Cave"),
            other => panic!("expected location, got {:?}", other),
        }
        assert!(g.resolve("Cave/Nothing").is_none());
    }

    #[test]
    fn canonical_follows_one_ref() {
        let g = graph();
        let alias = g.find_section("Shop", "Alias").unwrap();
        let canonical = g.canonical(alias);
        assert_eq!(canonical.full_id(), "Overworld/Cave/Chest");
        assert_eq!(canonical.access_rules(), &RuleSet::from_strs(&[&["lamp"]]));
    }

    #[test]
    fn reverse_refs_rebuild_lazily() {
        let g = graph();
        let refs = g.referencing_sections(&SectionRef::new("Overworld/Cave", "Chest"));
        assert_eq!(refs, vec![SectionRef::new("Shop", "Alias")]);
        assert!(g
            .referencing_sections(&SectionRef::new("Overworld/Ice Cave", "Chest"))
            .is_empty());
    }

    #[test]
    fn duplicate_policies() {
        let mut merged = graph();
        merged.insert(
            Location::new("Shop", None).with_section(LocationSection::new("Counter")),
            DuplicatePolicy::Merge,
        );
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.find_location("Shop", false).unwrap().sections().len(), 2);

        let mut renamed = graph();
        let id = renamed.insert(
            Location::new("Shop", None).with_section(LocationSection::new("Counter")),
            DuplicatePolicy::Rename,
        );
        assert_eq!(id, "Shop[2]");
        assert_eq!(renamed.len(), 5);
        assert_eq!(
            renamed.find_section("Shop[2]", "Counter").unwrap().full_id(),
            "Shop[2]/Counter"
        );
    }

    #[test]
    fn sections_are_mutable_through_partial_lookup() {
        let mut g = graph();
        let sec = g.find_section_mut("Ice Cave", "Chest").unwrap();
        assert!(sec.clear_item(false));
        assert_eq!(g.find_section("Overworld/Ice Cave", "Chest").unwrap().item_cleared(), 1);
    }
}
