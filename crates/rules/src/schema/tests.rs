//! Tests for schema types.

use super::*;

const ITEMS_JSON: &str = r#"
[
  { "name": "Sword", "type": "progressive", "allow_disabled": false, "loop": true,
    "stages": [
      { "name": "Fighter Sword", "codes": "sword,fsword" },
      { "name": "Master Sword", "codes": "msword", "inherit_codes": true }
    ] },
  { "name": "Bombs", "type": "consumable", "codes": "bombs",
    "max_quantity": 10, "increment": 5, "initial_quantity": 3 },
  { "name": "Mystery", "type": "teleporter" }
]
"#;

const LOCATIONS_JSON: &str = r#"
[
  { "name": "Overworld",
    "access_rules": ["boots", ["$has_mirror", "glove"]],
    "children": [
      { "name": "Cave", "access_rules": "lamp",
        "sections": [
          { "name": "Chest", "hosted_item": "heart, key" },
          { "name": "Alias", "ref": "@Overworld/Cave/Chest", "visibility_rules": 5 }
        ] }
    ] }
]
"#;

#[test]
fn deserialize_items() {
    let items: Vec<ItemDefinition> = serde_json::from_str(ITEMS_JSON).unwrap();
    assert_eq!(items.len(), 3);

    let sword = &items[0];
    assert_eq!(sword.kind, ItemType::Progressive);
    assert!(sword.looping);
    assert!(!sword.allow_disabled);
    assert_eq!(sword.stages.len(), 2);
    assert!(sword.stages[0].inherit_codes);
    assert_eq!(sword.stages[1].codes, "msword");

    let bombs = &items[1];
    assert_eq!(bombs.kind, ItemType::Consumable);
    assert_eq!(bombs.max_quantity, 10);
    assert_eq!(bombs.effective_decrement(), 5);
    assert_eq!(bombs.min_quantity, 0);
    assert!(bombs.allow_disabled);

    assert_eq!(items[2].kind, ItemType::Unknown);
}

#[test]
fn item_defaults() {
    let def: ItemDefinition = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
    assert_eq!(def.kind, ItemType::Toggle);
    assert_eq!(def.max_quantity, -1);
    assert_eq!(def.increment, 1);
    assert_eq!(def.decrement, None);
    assert_eq!(def.callbacks, CustomCallbacks::default());
}

#[test]
fn custom_callbacks_deserialize() {
    let def: ItemDefinition = serde_json::from_str(
        r#"{"name": "c", "type": "custom",
            "callbacks": {"provides_code": "count_it", "on_left_click": "click"}}"#,
    )
    .unwrap();
    assert_eq!(def.kind, ItemType::Custom);
    assert_eq!(def.callbacks.provides_code.as_deref(), Some("count_it"));
    assert_eq!(def.callbacks.on_right_click, None);
}

#[test]
fn deserialize_location_tree() {
    let locs: Vec<LocationDefinition> = serde_json::from_str(LOCATIONS_JSON).unwrap();
    let overworld = &locs[0];
    assert!(matches!(overworld.access_rules, Some(RuleSpec::Alternatives(ref a)) if a.len() == 2));
    let cave = &overworld.children[0];
    assert_eq!(cave.access_rules, Some(RuleSpec::Single("lamp".into())));
    assert_eq!(cave.sections[0].hosted_item, "heart, key");
    assert!(cave.sections[0].clear_as_group);
    assert_eq!(cave.sections[1].reference.as_deref(), Some("@Overworld/Cave/Chest"));
}

#[test]
fn normalize_rule_shapes() {
    let locs: Vec<LocationDefinition> = serde_json::from_str(LOCATIONS_JSON).unwrap();
    let rules = locs[0].access_rules.as_ref().unwrap();
    assert_eq!(
        rules.normalize(|_| panic!("no bad entries")),
        NormalizedRules::Own(vec![
            vec!["boots".to_string()],
            vec!["$has_mirror".to_string(), "glove".to_string()],
        ])
    );

    let single = RuleSpec::Single("a,b".into());
    assert_eq!(
        single.normalize(|_| {}),
        NormalizedRules::Own(vec![vec!["a,b".to_string()]])
    );
}

#[test]
fn invalid_rule_shapes_are_reported() {
    let locs: Vec<LocationDefinition> = serde_json::from_str(LOCATIONS_JSON).unwrap();
    let alias = &locs[0].children[0].sections[1];
    let mut reported = 0;
    let out = alias
        .visibility_rules
        .as_ref()
        .unwrap()
        .normalize(|_| reported += 1);
    assert_eq!(out, NormalizedRules::Inherit);
    assert_eq!(reported, 1);
}

#[test]
fn empty_rules_inherit() {
    assert_eq!(RuleSpec::Single(String::new()).normalize(|_| {}), NormalizedRules::Inherit);
    assert_eq!(RuleSpec::Alternatives(vec![]).normalize(|_| {}), NormalizedRules::Inherit);
}
