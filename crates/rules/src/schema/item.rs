//! Item list entries.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Item variant as written in packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Toggle,
    Static,
    Consumable,
    Progressive,
    ProgressiveToggle,
    CompositeToggle,
    ToggleBadged,
    Custom,
    /// Anything else. Rejected when the item is built.
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemType::Toggle => "toggle",
            ItemType::Static => "static",
            ItemType::Consumable => "consumable",
            ItemType::Progressive => "progressive",
            ItemType::ProgressiveToggle => "progressive_toggle",
            ItemType::CompositeToggle => "composite_toggle",
            ItemType::ToggleBadged => "toggle_badged",
            ItemType::Custom => "custom",
            ItemType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDefinition {
    pub name: String,
    /// Comma-separated.
    pub codes: String,
    /// Comma-separated.
    pub secondary_codes: String,
    /// Whether this stage also provides the codes of the stages before it.
    pub inherit_codes: bool,
}

impl Default for StageDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            codes: String::new(),
            secondary_codes: String::new(),
            inherit_codes: default_true(),
        }
    }
}

/// Host function names backing a `custom` item. Missing slots make the
/// corresponding operation a no-op (or `false`/`0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomCallbacks {
    pub can_provide_code: Option<String>,
    pub provides_code: Option<String>,
    pub on_left_click: Option<String>,
    pub on_right_click: Option<String>,
    pub save: Option<String>,
    pub load: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Comma-separated.
    pub codes: String,
    pub stages: Vec<StageDefinition>,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub allow_disabled: bool,
    pub min_quantity: i32,
    /// Negative means unbounded.
    pub max_quantity: i32,
    pub increment: i32,
    /// Defaults to `increment` when absent.
    pub decrement: Option<i32>,
    pub initial_quantity: i32,
    pub initial_stage_idx: i32,
    pub initial_active_state: bool,
    pub item_left: Option<String>,
    pub item_right: Option<String>,
    pub base_item: Option<String>,
    pub callbacks: CustomCallbacks,
}

impl Default for ItemDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ItemType::default(),
            codes: String::new(),
            stages: Vec::new(),
            looping: false,
            allow_disabled: default_true(),
            min_quantity: 0,
            max_quantity: -1,
            increment: 1,
            decrement: None,
            initial_quantity: 0,
            initial_stage_idx: 0,
            initial_active_state: false,
            item_left: None,
            item_right: None,
            base_item: None,
            callbacks: CustomCallbacks::default(),
        }
    }
}

impl ItemDefinition {
    /// Convenience constructor for code-built packs and tests.
    pub fn new(name: &str, kind: ItemType, codes: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            codes: codes.to_string(),
            ..Self::default()
        }
    }

    pub fn effective_decrement(&self) -> i32 {
        self.decrement.unwrap_or(self.increment)
    }
}
