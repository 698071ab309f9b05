//! The tracker: owner of items, locations and the logic cache.
//!
//! Every mutation goes through [`Tracker::notify`], which is the one place
//! that invalidates the cache and emits change events. Inside a bulk
//! update both are deferred until the outermost
//! [`end_bulk_update`](Tracker::end_bulk_update).

mod links;
mod state;

pub use state::FORMAT_VERSION;

use std::rc::Rc;

use indexmap::IndexSet;
use tracing::{debug, info, warn};
use tracklogic_core::{AccessibilityLevel, Action, EngineConfig, Highlight, Result, TrackerError};

use crate::evaluator::{Evaluator, LogicCache, PathStack};
use crate::events::{SectionRef, Signal, SubscriptionId, TrackerEvent};
use crate::item::{Item, ItemChange};
use crate::loader::flatten_locations;
use crate::location::{Location, LocationGraph, LocationSection, RefTarget};
use crate::rule::RuleSet;
use crate::schema::{ItemDefinition, LocationDefinition};
use crate::script::{NullHost, ScriptHost};

#[derive(Debug, Default)]
struct BulkUpdate {
    depth: u32,
    dirty: bool,
    /// Deferred events, first occurrence order.
    pending: IndexSet<TrackerEvent>,
}

pub struct Tracker {
    config: EngineConfig,
    host: Rc<dyn ScriptHost>,
    items: Vec<Item>,
    next_item_id: u64,
    graph: LocationGraph,
    cache: LogicCache,
    events: Signal<TrackerEvent>,
    bulk: BulkUpdate,
}

impl Tracker {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_script_host(config, Rc::new(NullHost))
    }

    pub fn with_script_host(config: EngineConfig, host: Rc<dyn ScriptHost>) -> Self {
        Self {
            config,
            host,
            items: Vec::new(),
            next_item_id: 1,
            graph: LocationGraph::new(),
            cache: LogicCache::new(),
            events: Signal::new(),
            bulk: BulkUpdate::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Swap the scripting host, including the one custom items call.
    pub fn set_script_host(&mut self, host: Rc<dyn ScriptHost>) {
        for item in &mut self.items {
            item.set_script_host(&host);
        }
        self.host = host;
        self.invalidate();
    }

    // ── Loading ─────────────────────────────────────────────────────

    /// Build items from definitions and append them. Ids are assigned
    /// monotonically and never reused, even across [`unload`](Self::unload).
    /// Definitions that fail to build are skipped with a warning.
    pub fn load_items(&mut self, defs: &[ItemDefinition]) -> Vec<String> {
        let mut ids = Vec::with_capacity(defs.len());
        for def in defs {
            let id = self.next_item_id.to_string();
            self.next_item_id += 1;
            match Item::from_definition(id, def, self.config.case_insensitive_codes, &self.host) {
                Ok(item) => {
                    ids.push(item.id().to_string());
                    self.items.push(item);
                }
                Err(e) => warn!(item = %def.name, error = %e, "skipping item"),
            }
        }
        info!(loaded = ids.len(), total = self.items.len(), "items loaded");
        self.invalidate();
        ids
    }

    /// Insert already flattened locations. Returns the ids they ended up
    /// under after the duplicate policy was applied.
    pub fn add_locations(&mut self, locations: Vec<Location>) -> Vec<String> {
        let policy = self.config.duplicate_locations;
        let ids: Vec<String> = locations
            .into_iter()
            .map(|loc| self.graph.insert(loc, policy))
            .collect();
        info!(added = ids.len(), total = self.graph.len(), "locations loaded");
        self.invalidate();
        ids
    }

    /// Flatten a location tree against what is already loaded, then add it.
    pub fn load_locations(&mut self, defs: &[LocationDefinition]) -> Vec<String> {
        let flat = flatten_locations(defs, &self.graph);
        self.add_locations(flat)
    }

    /// Drop all items and locations. Item ids keep counting up.
    pub fn unload(&mut self) {
        self.items.clear();
        self.graph.clear();
        self.invalidate();
    }

    // ── Lookup ──────────────────────────────────────────────────────

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_by_id(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id() == id)
    }

    fn item_index(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id() == id)
    }

    /// Item whose icon and stage represent `id`: the base item for a
    /// badge (when loaded), otherwise the item itself.
    pub fn display_item(&self, id: &str) -> Option<&Item> {
        let item = self.item_by_id(id)?;
        let base = item.base_item().and_then(|code| {
            self.items
                .iter()
                .find(|other| other.id() != item.id() && other.can_provide_code(code))
        });
        Some(base.unwrap_or(item))
    }

    /// First item (declaration order) that can provide `code`.
    pub fn find_item_for_code(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.can_provide_code(code))
    }

    pub fn locations(&self) -> &LocationGraph {
        &self.graph
    }

    pub fn find_location(&self, id: &str) -> Option<&Location> {
        self.graph.find_location(id, true)
    }

    pub fn find_section(&self, location_id: &str, name: &str) -> Option<&LocationSection> {
        self.graph.find_section(location_id, name)
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(
            &self.items,
            &self.graph,
            &self.cache,
            self.host.as_ref(),
            self.config.max_reference_repeats,
        )
    }

    /// Evaluate a free-standing rule-set.
    pub fn evaluate(&self, rules: &RuleSet, visibility: bool) -> AccessibilityLevel {
        self.evaluator()
            .evaluate(rules, visibility, &PathStack::new())
            .level
    }

    fn target(&self, location_id: &str, section: Option<&str>) -> Option<RefTarget<'_>> {
        let target = match section {
            Some(name) => self.graph.find_section(location_id, name).map(RefTarget::Section),
            None => self.graph.find_location(location_id, true).map(RefTarget::Location),
        };
        if target.is_none() {
            warn!(location = %location_id, section = ?section, "query for unknown location");
        }
        target
    }

    /// Access level of a location, or of one of its sections.
    pub fn is_reachable(&self, location_id: &str, section: Option<&str>) -> AccessibilityLevel {
        self.target(location_id, section)
            .map(|t| self.evaluator().query(t, false).level)
            .unwrap_or(AccessibilityLevel::None)
    }

    /// Whether the visibility rules give anything but `None`.
    pub fn is_visible(&self, location_id: &str, section: Option<&str>) -> bool {
        self.target(location_id, section)
            .map(|t| self.evaluator().query(t, true).level.is_some())
            .unwrap_or(false)
    }

    /// Reachability as shown for a section: `Cleared` once every item is
    /// taken and every hosted item collected. Alias sections report their
    /// canonical section.
    pub fn section_status(&self, location_id: &str, section: &str) -> AccessibilityLevel {
        let Some(sec) = self.graph.find_section(location_id, section) else {
            warn!(location = %location_id, section = %section, "status for unknown section");
            return AccessibilityLevel::None;
        };
        let canonical = self.graph.canonical(sec);
        let eval = self.evaluator();
        let collected = canonical
            .hosted_items()
            .iter()
            .all(|code| eval.provider_count(code) >= 1);
        if canonical.item_cleared() >= canonical.item_count() && collected {
            return AccessibilityLevel::Cleared;
        }
        eval.query(RefTarget::Section(canonical), false).level
    }

    pub fn provider_count_for_code(&self, code: &str) -> i32 {
        self.evaluator().provider_count(code)
    }

    /// Increments once per invalidation.
    pub fn cache_epoch(&self) -> u64 {
        self.cache.epoch()
    }

    // ── Item mutation ───────────────────────────────────────────────

    /// Apply a user action. Returns whether anything changed.
    pub fn change_item_state(&mut self, id: &str, action: Action) -> bool {
        let Some(idx) = self.item_index(id) else {
            warn!(item = %id, action = %action, "action on unknown item");
            return false;
        };
        if self.items[idx].ignores_user_input() {
            debug!(item = %id, action = %action, "item ignores user input");
            return false;
        }
        let change = self.items[idx].change_state(action);
        self.apply_change(idx, change)
    }

    /// Run `f` against an item (setters, scripted assignment) and publish
    /// whatever it changed.
    pub fn update_item(&mut self, id: &str, f: impl FnOnce(&mut Item) -> ItemChange) -> Result<bool> {
        let idx = self
            .item_index(id)
            .ok_or_else(|| TrackerError::UnknownItem(id.to_string()))?;
        let change = f(&mut self.items[idx]);
        Ok(self.apply_change(idx, change))
    }

    pub fn set_item_state(&mut self, id: &str, state: i32, stage: i32) -> Result<bool> {
        self.update_item(id, |item| item.set_state(state, stage))
    }

    pub fn set_item_count(&mut self, id: &str, count: i32) -> Result<bool> {
        self.update_item(id, |item| item.set_count(count))
    }

    fn apply_change(&mut self, idx: usize, change: ItemChange) -> bool {
        if !change.any() {
            return false;
        }
        self.item_changed(idx, change);
        if change.state {
            for dependent in links::propagate(&mut self.items, idx) {
                self.item_changed(dependent, ItemChange::state());
            }
        }
        true
    }

    fn item_changed(&mut self, idx: usize, change: ItemChange) {
        let item_id = self.items[idx].id().to_string();
        if change.state {
            self.notify(TrackerEvent::StateChanged {
                item_id: item_id.clone(),
            });
        }
        if change.display {
            self.notify(TrackerEvent::DisplayChanged { item_id });
        }
    }

    // ── Section mutation ────────────────────────────────────────────

    /// Section to edit for `location_id/name`: the canonical one for aliases.
    fn editable_section(&mut self, location_id: &str, name: &str) -> Result<&mut LocationSection> {
        let unknown = || TrackerError::UnknownSection {
            location: location_id.to_string(),
            section: name.to_string(),
        };
        let sec = self.graph.find_section(location_id, name).ok_or_else(unknown)?;
        let canonical = self.graph.canonical(sec).section_ref();
        self.graph
            .find_section_mut(&canonical.location, &canonical.section)
            .ok_or_else(unknown)
    }

    fn edit_section(
        &mut self,
        location_id: &str,
        name: &str,
        f: impl FnOnce(&mut LocationSection) -> bool,
    ) -> Result<bool> {
        let sec = self.editable_section(location_id, name)?;
        let changed = f(sec);
        let sref = sec.section_ref();
        if changed {
            self.section_changed(sref);
        }
        Ok(changed)
    }

    /// Mark one item (or all of them) as taken.
    pub fn clear_section(&mut self, location_id: &str, name: &str, all: bool) -> Result<bool> {
        self.edit_section(location_id, name, |s| s.clear_item(all))
    }

    pub fn unclear_section(&mut self, location_id: &str, name: &str) -> Result<bool> {
        self.edit_section(location_id, name, LocationSection::unclear_item)
    }

    pub fn set_section_highlight(
        &mut self,
        location_id: &str,
        name: &str,
        highlight: Highlight,
    ) -> Result<bool> {
        self.edit_section(location_id, name, |s| s.set_highlight(highlight))
    }

    /// Notify for a section and every section aliasing it.
    fn section_changed(&mut self, sref: SectionRef) {
        let aliases = self.graph.referencing_sections(&sref);
        self.notify(TrackerEvent::SectionChanged(sref));
        for alias in aliases {
            self.notify(TrackerEvent::SectionChanged(alias));
        }
    }

    // ── Bulk updates ────────────────────────────────────────────────

    /// Start deferring invalidation and events. Nests.
    pub fn begin_bulk_update(&mut self) {
        self.bulk.depth += 1;
    }

    /// Leave a bulk update. The outermost call invalidates once, replays the
    /// deferred events in order and emits [`TrackerEvent::BulkUpdateDone`].
    pub fn end_bulk_update(&mut self) {
        if self.bulk.depth == 0 {
            warn!("end_bulk_update without matching begin");
            return;
        }
        self.bulk.depth -= 1;
        if self.bulk.depth > 0 {
            return;
        }

        if std::mem::take(&mut self.bulk.dirty) {
            self.cache.invalidate();
        }
        let pending = std::mem::take(&mut self.bulk.pending);
        debug!(events = pending.len(), "bulk update committed");
        for event in &pending {
            self.events.emit(event);
        }
        self.events.emit(&TrackerEvent::BulkUpdateDone);
    }

    pub fn in_bulk_update(&self) -> bool {
        self.bulk.depth > 0
    }

    pub fn bulk_update<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_bulk_update();
        let result = f(self);
        self.end_bulk_update();
        result
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Subscribers run synchronously and cannot reach back into the tracker.
    pub fn subscribe(&mut self, f: impl FnMut(&TrackerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ── Mutation hook ───────────────────────────────────────────────

    fn notify(&mut self, event: TrackerEvent) {
        let affects_logic = matches!(
            event,
            TrackerEvent::StateChanged { .. } | TrackerEvent::SectionChanged(_)
        );
        if self.in_bulk_update() {
            self.bulk.dirty |= affects_logic;
            self.bulk.pending.insert(event);
            return;
        }
        if affects_logic {
            self.cache.invalidate();
        }
        self.events.emit(&event);
    }

    fn invalidate(&mut self) {
        if self.in_bulk_update() {
            self.bulk.dirty = true;
        } else {
            self.cache.invalidate();
        }
    }
}
