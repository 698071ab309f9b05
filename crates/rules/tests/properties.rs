//! End-to-end behavior of the tracker: item state machines, rule
//! evaluation, cache coherence and composite notifications.

use std::cell::RefCell;
use std::rc::Rc;

use tracklogic_core::{AccessibilityLevel as L, Action, EngineConfig};
use tracklogic_rules::schema::{ItemDefinition, ItemType, StageDefinition};
use tracklogic_rules::{Location, LocationSection, RuleSet, Tracker, TrackerEvent};

fn tracker_with(items: &[ItemDefinition]) -> Tracker {
    let mut t = Tracker::new(EngineConfig::default());
    t.load_items(items);
    t
}

fn stages(n: usize) -> Vec<StageDefinition> {
    (0..n)
        .map(|i| StageDefinition {
            name: format!("Stage {i}"),
            codes: format!("s{i}"),
            ..StageDefinition::default()
        })
        .collect()
}

fn located(rules: &[&[&str]]) -> Location {
    Location::new("L", None)
        .with_access_rules(RuleSet::from_strs(rules))
        .with_section(LocationSection::new("S").with_access_rules(RuleSet::from_strs(rules)))
}

// ── Item state machines ─────────────────────────────────────────────

#[test]
fn consumable_count_stays_in_bounds() {
    let mut t = tracker_with(&[ItemDefinition {
        min_quantity: 1,
        max_quantity: 7,
        increment: 3,
        decrement: Some(2),
        initial_quantity: 1,
        ..ItemDefinition::new("Arrows", ItemType::Consumable, "arrows")
    }]);
    let actions = [
        Action::Primary,
        Action::Primary,
        Action::Single,
        Action::Primary,
        Action::Secondary,
        Action::Secondary,
        Action::Secondary,
        Action::Single,
        Action::Single,
        Action::Secondary,
    ];
    for action in actions.iter().cycle().take(60) {
        t.change_item_state("1", *action);
        let count = t.item_by_id("1").unwrap().count();
        assert!((1..=7).contains(&count), "count {count} after {action}");
    }
}

#[test]
fn non_looping_progressive_saturates() {
    let mut t = tracker_with(&[ItemDefinition {
        stages: stages(3),
        allow_disabled: false,
        ..ItemDefinition::new("Sword", ItemType::Progressive, "")
    }]);
    assert!(t.change_item_state("1", Action::Next));
    assert!(t.change_item_state("1", Action::Next));
    for _ in 0..3 {
        assert!(!t.change_item_state("1", Action::Next));
        assert_eq!(t.item_by_id("1").unwrap().active_stage(), 2);
    }
}

#[test]
fn looping_progressive_cycles_through_every_stage() {
    let mut t = tracker_with(&[ItemDefinition {
        stages: stages(4),
        allow_disabled: false,
        looping: true,
        ..ItemDefinition::new("Gloves", ItemType::Progressive, "")
    }]);
    let mut seen = Vec::new();
    for _ in 0..4 {
        assert!(t.change_item_state("1", Action::Next));
        seen.push(t.item_by_id("1").unwrap().active_stage());
    }
    assert_eq!(seen, vec![1, 2, 3, 0]);
    assert_eq!(t.item_by_id("1").unwrap().current_name(), "Stage 0");
}

// ── Rule evaluation ─────────────────────────────────────────────────

#[test]
fn basic_rule_levels() {
    let t = tracker_with(&[]);
    assert_eq!(t.evaluate(&RuleSet::from_strs(&[&[]]), false), L::Normal);
    assert_eq!(t.evaluate(&RuleSet::from_strs(&[]), false), L::Normal);
    assert_eq!(t.evaluate(&RuleSet::from_strs(&[&["[A]"]]), false), L::SequenceBreak);
    assert_eq!(t.evaluate(&RuleSet::from_strs(&[&["A"]]), false), L::None);
    assert_eq!(t.evaluate(&RuleSet::from_strs(&[&["{}"]]), false), L::Inspect);
}

#[test]
fn self_reference_terminates_as_none() {
    let mut t = tracker_with(&[]);
    t.add_locations(vec![Location::new("Self", None)
        .with_access_rules(RuleSet::from_strs(&[&["@Self"]]))
        .with_section(
            LocationSection::new("Loop").with_access_rules(RuleSet::from_strs(&[&["@Self/Loop"]])),
        )]);
    assert_eq!(t.is_reachable("Self", None), L::None);
    assert_eq!(t.is_reachable("Self", Some("Loop")), L::None);
    // Visibility has no rules of its own here.
    assert!(t.is_visible("Self", Some("Loop")));
}

// ── Cache coherence ─────────────────────────────────────────────────

#[test]
fn provider_counts_follow_item_changes() {
    let mut t = tracker_with(&[ItemDefinition::new("Hammer", ItemType::Toggle, "hammer")]);
    assert_eq!(t.provider_count_for_code("hammer"), 0);
    t.change_item_state("1", Action::Primary);
    assert_eq!(t.provider_count_for_code("hammer"), 1);
    t.change_item_state("1", Action::Secondary);
    assert_eq!(t.provider_count_for_code("hammer"), 0);
}

#[test]
fn bulk_update_commits_final_state_once() {
    let mut t = tracker_with(&[ItemDefinition::new("Hammer", ItemType::Toggle, "hammer")]);
    assert_eq!(t.provider_count_for_code("hammer"), 0);
    let epoch = t.cache_epoch();

    t.bulk_update(|t| {
        t.change_item_state("1", Action::Primary);
        t.change_item_state("1", Action::Secondary);
        t.change_item_state("1", Action::Primary);
    });
    assert_eq!(t.cache_epoch(), epoch + 1);
    assert_eq!(t.provider_count_for_code("hammer"), 1);
}

// ── Composite toggles ───────────────────────────────────────────────

#[test]
fn composite_link_emits_one_event_per_side() {
    let mut t = tracker_with(&[
        ItemDefinition::new("Bow", ItemType::Toggle, "bow"),
        ItemDefinition::new("Silver Arrows", ItemType::Toggle, "silver"),
        ItemDefinition {
            item_left: Some("bow".into()),
            item_right: Some("silver".into()),
            ..ItemDefinition::new("Bows", ItemType::CompositeToggle, "bows")
        },
    ]);
    let events = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&events);
    t.subscribe(move |e| {
        if matches!(e, TrackerEvent::StateChanged { .. }) {
            *counter.borrow_mut() += 1;
        }
    });

    t.change_item_state("1", Action::Primary);
    assert_eq!(*events.borrow(), 2);
    assert_eq!(t.item_by_id("3").unwrap().active_stage(), 1);

    t.change_item_state("3", Action::Primary);
    assert_eq!(*events.borrow(), 4);
    assert_eq!(t.provider_count_for_code("bow"), 0);
}

// ── Scenarios ───────────────────────────────────────────────────────

#[test]
fn sword_unlocks_location() {
    let mut t = tracker_with(&[ItemDefinition::new("Sword", ItemType::Toggle, "sword")]);
    t.add_locations(vec![located(&[&["[sword]"]])]);
    assert_eq!(t.is_reachable("L", None), L::SequenceBreak);
    assert!(t.change_item_state("1", Action::Primary));
    assert_eq!(t.is_reachable("L", None), L::Normal);
}

#[test]
fn rubies_unlock_section() {
    let mut t = tracker_with(&[ItemDefinition {
        max_quantity: 5,
        initial_quantity: 2,
        ..ItemDefinition::new("Ruby", ItemType::Consumable, "ruby")
    }]);
    t.add_locations(vec![located(&[&["ruby:3"]])]);
    assert_eq!(t.is_reachable("L", Some("S")), L::None);
    t.change_item_state("1", Action::Primary);
    t.change_item_state("1", Action::Primary);
    assert_eq!(t.item_by_id("1").unwrap().count(), 4);
    assert_eq!(t.is_reachable("L", Some("S")), L::Normal);
}
