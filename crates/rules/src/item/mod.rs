//! Trackable items.
//!
//! One concrete [`Item`] type covers every variant; variant-specific data
//! lives in [`ItemKind`] and variant-specific behavior in the `transition`
//! functions. Custom items forward everything to the [`ScriptHost`].

mod persist;
mod transition;

use std::fmt;
use std::rc::Rc;

use tracing::warn;
use tracklogic_core::{Action, Result, TrackerError};

use crate::rule::comma_split;
use crate::schema::{CustomCallbacks, ItemDefinition, ItemType, StageDefinition};
use crate::script::{ScriptHost, ScriptValue};

// ── Stages ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub codes: Vec<String>,
    pub secondary_codes: Vec<String>,
    pub inherit_codes: bool,
}

impl Stage {
    fn from_definition(def: &StageDefinition) -> Self {
        Self {
            name: def.name.clone(),
            codes: comma_split(&def.codes),
            secondary_codes: comma_split(&def.secondary_codes),
            inherit_codes: def.inherit_codes,
        }
    }

    fn with_codes(codes: Vec<String>) -> Self {
        Self {
            name: String::new(),
            codes,
            secondary_codes: Vec::new(),
            inherit_codes: false,
        }
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }
}

// ── Variants ────────────────────────────────────────────────────────

/// Script-backed behavior of a `custom` item.
#[derive(Clone)]
pub struct ScriptedItem {
    callbacks: CustomCallbacks,
    host: Rc<dyn ScriptHost>,
}

impl ScriptedItem {
    pub fn callbacks(&self) -> &CustomCallbacks {
        &self.callbacks
    }

    /// Call the named slot, logging and swallowing host errors.
    fn call(&self, item_id: &str, slot: Option<&String>, args: Vec<String>) -> Option<ScriptValue> {
        let name = slot?;
        match self.host.call_function(name, &args) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(item = %item_id, function = %name, error = %e, "custom item callback failed");
                None
            }
        }
    }
}

impl fmt::Debug for ScriptedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedItem")
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Toggle,
    Static,
    Consumable,
    Progressive,
    ProgressiveToggle,
    /// Two-bit composite of the items providing `left` and `right`.
    CompositeToggle { left: String, right: String },
    /// Badge over the item providing `base`.
    ToggleBadged { base: Option<String> },
    Custom(ScriptedItem),
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Toggle => ItemType::Toggle,
            ItemKind::Static => ItemType::Static,
            ItemKind::Consumable => ItemType::Consumable,
            ItemKind::Progressive => ItemType::Progressive,
            ItemKind::ProgressiveToggle => ItemType::ProgressiveToggle,
            ItemKind::CompositeToggle { .. } => ItemType::CompositeToggle,
            ItemKind::ToggleBadged { .. } => ItemType::ToggleBadged,
            ItemKind::Custom(_) => ItemType::Custom,
        }
    }
}

/// What a mutation touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemChange {
    /// State, stage, count or limits changed.
    pub state: bool,
    /// Icon override set or cleared.
    pub display: bool,
}

impl ItemChange {
    pub const NONE: ItemChange = ItemChange {
        state: false,
        display: false,
    };

    pub fn state() -> Self {
        Self {
            state: true,
            display: false,
        }
    }

    pub fn any(self) -> bool {
        self.state || self.display
    }
}

/// Which defaults have been overridden since load; only those are saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Overrides {
    min_count: bool,
    max_count: bool,
    increment: bool,
    decrement: bool,
}

// ── Item ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Item {
    id: String,
    name: String,
    kind: ItemKind,
    codes: Vec<String>,
    stages: Vec<Stage>,
    looping: bool,
    allow_disabled: bool,
    case_insensitive: bool,
    stage1: i32,
    stage2: i32,
    count: i32,
    min_count: i32,
    max_count: i32,
    increment: i32,
    decrement: i32,
    overlay: String,
    img_override: Option<String>,
    ignore_user_input: bool,
    overrides: Overrides,
}

fn clamp_count(n: i32, min: i32, max: i32) -> i32 {
    let n = if max >= 0 { n.min(max) } else { n };
    n.max(min)
}

impl Item {
    /// Build an item from its definition. `id` is assigned by the owner.
    pub fn from_definition(
        id: String,
        def: &ItemDefinition,
        case_insensitive: bool,
        host: &Rc<dyn ScriptHost>,
    ) -> Result<Self> {
        let mut looping = def.looping;
        let mut allow_disabled = def.allow_disabled;
        let mut stage1 = 0;
        let mut stages: Vec<Stage> = def.stages.iter().map(Stage::from_definition).collect();

        let kind = match def.kind {
            ItemType::Toggle => ItemKind::Toggle,
            ItemType::Static => ItemKind::Static,
            ItemType::Consumable => ItemKind::Consumable,
            ItemType::Progressive => ItemKind::Progressive,
            ItemType::ProgressiveToggle => ItemKind::ProgressiveToggle,
            ItemType::CompositeToggle => {
                let (left, right) = match (&def.item_left, &def.item_right) {
                    (Some(l), Some(r)) if !l.is_empty() && !r.is_empty() => (l.clone(), r.clone()),
                    _ => {
                        return Err(TrackerError::Definition(format!(
                            "composite toggle '{}' needs item_left and item_right",
                            def.name
                        )))
                    }
                };
                // none / left / right / both
                stages = vec![
                    Stage::with_codes(Vec::new()),
                    Stage::with_codes(vec![left.clone()]),
                    Stage::with_codes(vec![right.clone()]),
                    Stage::with_codes(vec![left.clone(), right.clone()]),
                ];
                ItemKind::CompositeToggle { left, right }
            }
            ItemType::ToggleBadged => ItemKind::ToggleBadged {
                base: def.base_item.clone().filter(|b| !b.is_empty()),
            },
            ItemType::Custom => ItemKind::Custom(ScriptedItem {
                callbacks: def.callbacks.clone(),
                host: Rc::clone(host),
            }),
            ItemType::Unknown => {
                return Err(TrackerError::Definition(format!(
                    "item '{}' has an unknown type",
                    def.name
                )))
            }
        };

        match kind {
            ItemKind::Toggle | ItemKind::ToggleBadged { .. } => allow_disabled = true,
            ItemKind::ProgressiveToggle => {
                looping = true;
                allow_disabled = true;
            }
            ItemKind::Static => {
                allow_disabled = false;
                stage1 = 1;
            }
            ItemKind::CompositeToggle { .. } => stage1 = 1,
            _ => {}
        }

        if matches!(
            kind,
            ItemKind::Toggle | ItemKind::ToggleBadged { .. } | ItemKind::ProgressiveToggle
        ) && def.initial_active_state
        {
            stage1 = 1;
        }

        let last_stage = (stages.len() as i32 - 1).max(0);
        let stage2 = def.initial_stage_idx.clamp(0, last_stage);
        let count = clamp_count(def.initial_quantity, def.min_quantity, def.max_quantity);
        if matches!(kind, ItemKind::Consumable) && count > 0 {
            stage1 = 1;
        }

        Ok(Self {
            id,
            name: def.name.clone(),
            kind,
            codes: comma_split(&def.codes),
            stages,
            looping,
            allow_disabled,
            case_insensitive,
            stage1,
            stage2,
            count,
            min_count: def.min_quantity,
            max_count: def.max_quantity,
            increment: def.increment,
            decrement: def.effective_decrement(),
            overlay: String::new(),
            img_override: None,
            ignore_user_input: false,
            overrides: Overrides::default(),
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active stage's name, falling back to the item name.
    pub fn current_name(&self) -> &str {
        self.stages
            .get(self.stage2 as usize)
            .map(|s| s.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Enabled flag; items that cannot be disabled always report 1.
    pub fn state(&self) -> i32 {
        if self.allow_disabled {
            self.stage1
        } else {
            1
        }
    }

    pub fn active_stage(&self) -> i32 {
        self.stage2
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn min_count(&self) -> i32 {
        self.min_count
    }

    pub fn max_count(&self) -> i32 {
        self.max_count
    }

    pub fn increment(&self) -> i32 {
        self.increment
    }

    pub fn decrement(&self) -> i32 {
        self.decrement
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn allows_disabled(&self) -> bool {
        self.allow_disabled
    }

    pub fn overlay(&self) -> &str {
        &self.overlay
    }

    pub fn icon_override(&self) -> Option<&str> {
        self.img_override.as_deref()
    }

    pub fn ignores_user_input(&self) -> bool {
        self.ignore_user_input
    }

    /// Code of the item a badge is drawn over.
    pub fn base_item(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::ToggleBadged { base } => base.as_deref(),
            _ => None,
        }
    }

    /// Left/right codes of a composite toggle.
    pub fn composite_parts(&self) -> Option<(&str, &str)> {
        match &self.kind {
            ItemKind::CompositeToggle { left, right } => Some((left, right)),
            _ => None,
        }
    }

    // ── Codes ───────────────────────────────────────────────────────

    fn top_level_code(&self, code: &str) -> bool {
        if self.case_insensitive {
            self.codes.iter().any(|c| c.eq_ignore_ascii_case(code))
        } else {
            self.codes.iter().any(|c| c == code)
        }
    }

    /// Whether this item could ever provide `code`, regardless of state.
    pub fn can_provide_code(&self, code: &str) -> bool {
        if let ItemKind::Custom(scripted) = &self.kind {
            return scripted
                .call(
                    &self.id,
                    scripted.callbacks.can_provide_code.as_ref(),
                    vec![code.to_string()],
                )
                .map(|v| v.is_truthy())
                .unwrap_or(false);
        }
        self.top_level_code(code) || self.stages.iter().any(|s| s.has_code(code))
    }

    /// How many units of `code` this item currently provides. Never negative.
    pub fn provides_code(&self, code: &str) -> i32 {
        match &self.kind {
            ItemKind::Custom(scripted) => {
                return scripted
                    .call(
                        &self.id,
                        scripted.callbacks.provides_code.as_ref(),
                        vec![code.to_string()],
                    )
                    .map(|v| v.as_count().max(0))
                    .unwrap_or(0);
            }
            // Left/right codes are provided by the sub-items themselves.
            ItemKind::CompositeToggle { .. } => {
                if self.codes.iter().any(|c| c == code) {
                    return (self.stage2 & 1) + ((self.stage2 >> 1) & 1);
                }
                return 0;
            }
            _ => {}
        }

        if (self.stage2 as usize) < self.stages.len() {
            if self.allow_disabled && self.stage1 == 0 {
                return 0;
            }
            for stage in self.stages[..=self.stage2 as usize].iter().rev() {
                if stage.has_code(code) {
                    return 1;
                }
                if !stage.inherit_codes {
                    break;
                }
            }
            return 0;
        }

        if self.count > 0 && self.can_provide_code(code) {
            return self.count;
        }
        i32::from(self.stage1 != 0 && self.can_provide_code(code))
    }

    // ── Mutation ────────────────────────────────────────────────────

    /// Apply a user action. Clears an icon override on any state change.
    pub fn change_state(&mut self, action: Action) -> ItemChange {
        if let ItemKind::Custom(scripted) = &self.kind {
            let slot = match action {
                Action::Secondary | Action::Prev => scripted.callbacks.on_right_click.as_ref(),
                _ => scripted.callbacks.on_left_click.as_ref(),
            };
            let changed = scripted
                .call(&self.id, slot, vec![self.id.clone(), action.to_string()])
                .map(|v| v != ScriptValue::Bool(false))
                .unwrap_or(false);
            return if changed {
                ItemChange::state()
            } else {
                ItemChange::NONE
            };
        }

        if !transition::apply(self, action) {
            return ItemChange::NONE;
        }
        ItemChange {
            state: true,
            display: self.img_override.take().is_some(),
        }
    }

    /// Programmatic assignment. Negative values keep the current value;
    /// the stage is clamped to the stage range.
    pub fn set_state(&mut self, state: i32, stage: i32) -> ItemChange {
        let state = if state < 0 { self.stage1 } else { state.min(1) };
        let mut stage = if stage < 0 { self.stage2 } else { stage };
        if !self.stages.is_empty() {
            stage = stage.min(self.stages.len() as i32 - 1);
        }
        if state == self.stage1 && stage == self.stage2 {
            return ItemChange::NONE;
        }
        self.stage1 = state;
        self.stage2 = stage;
        ItemChange::state()
    }

    /// Set the enabled flag the way scripts do. Progressive items with a
    /// disabled stage fall back to stage 0 when disabled.
    pub fn set_active(&mut self, active: bool) -> ItemChange {
        let mut active = active;
        if matches!(self.kind, ItemKind::Progressive) && self.allow_disabled && !active {
            self.stage2 = 0;
        } else if !self.allow_disabled {
            active = true;
        }
        let value = i32::from(active);
        if self.stage1 == value {
            return ItemChange::NONE;
        }
        self.stage1 = value;
        ItemChange {
            state: true,
            display: self.img_override.take().is_some(),
        }
    }

    /// Set the composite's two bits directly.
    pub(crate) fn set_composite_bits(&mut self, bits: i32) -> ItemChange {
        let bits = bits & 3;
        if self.stage2 == bits && self.stage1 == 1 {
            return ItemChange::NONE;
        }
        self.stage1 = 1;
        self.stage2 = bits;
        ItemChange::state()
    }

    /// Set the count, clamped into `[min, max]`.
    pub fn set_count(&mut self, n: i32) -> ItemChange {
        let n = clamp_count(n, self.min_count, self.max_count);
        if n == self.count {
            return ItemChange::NONE;
        }
        self.count = n;
        if matches!(self.kind, ItemKind::Consumable) {
            self.stage1 = i32::from(n > 0);
        }
        ItemChange::state()
    }

    pub fn set_min_count(&mut self, min: i32) -> ItemChange {
        if min == self.min_count {
            return ItemChange::NONE;
        }
        self.min_count = min;
        self.overrides.min_count = true;
        self.set_count(self.count);
        ItemChange::state()
    }

    /// Negative means unbounded.
    pub fn set_max_count(&mut self, max: i32) -> ItemChange {
        if max == self.max_count {
            return ItemChange::NONE;
        }
        self.max_count = max;
        self.overrides.max_count = true;
        self.set_count(self.count);
        ItemChange::state()
    }

    pub fn set_increment(&mut self, n: i32) -> ItemChange {
        if n == self.increment {
            return ItemChange::NONE;
        }
        self.increment = n;
        self.overrides.increment = true;
        ItemChange::state()
    }

    pub fn set_decrement(&mut self, n: i32) -> ItemChange {
        if n == self.decrement {
            return ItemChange::NONE;
        }
        self.decrement = n;
        self.overrides.decrement = true;
        ItemChange::state()
    }

    pub fn set_overlay(&mut self, text: &str) -> ItemChange {
        if self.overlay == text {
            return ItemChange::NONE;
        }
        self.overlay = text.to_string();
        ItemChange::state()
    }

    pub fn set_icon_override(&mut self, img: Option<String>) -> ItemChange {
        if self.img_override == img {
            return ItemChange::NONE;
        }
        self.img_override = img;
        ItemChange {
            state: false,
            display: true,
        }
    }

    pub fn set_ignore_user_input(&mut self, ignore: bool) -> ItemChange {
        if self.ignore_user_input == ignore {
            return ItemChange::NONE;
        }
        self.ignore_user_input = ignore;
        ItemChange::state()
    }

    pub(crate) fn set_script_host(&mut self, host: &Rc<dyn ScriptHost>) {
        if let ItemKind::Custom(scripted) = &mut self.kind {
            scripted.host = Rc::clone(host);
        }
    }
}
