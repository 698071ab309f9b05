//! Item save/load as JSON values.

use serde_json::{json, Map, Value};
use tracing::warn;

use super::{clamp_count, Item, ItemChange, ItemKind};
use crate::script::ScriptValue;

fn int_or(v: Option<&Value>, default: i32) -> i32 {
    v.and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(default)
}

impl Item {
    /// Serialize the mutable part of the item. Limits and steps are only
    /// written when they differ from the definition.
    pub fn save(&self) -> Value {
        let mut data = Map::new();
        data.insert("overlay".into(), json!(self.overlay));
        data.insert("state".into(), json!([self.stage1, self.stage2]));
        data.insert("count".into(), json!(self.count));
        if self.overrides.min_count {
            data.insert("min_count".into(), json!(self.min_count));
        }
        if self.overrides.max_count {
            data.insert("max_count".into(), json!(self.max_count));
        }
        if self.overrides.increment {
            data.insert("increment".into(), json!(self.increment));
        }
        if self.overrides.decrement {
            data.insert("decrement".into(), json!(self.decrement));
        }
        if let Some(img) = &self.img_override {
            data.insert("img".into(), json!(img));
        }
        if self.ignore_user_input {
            data.insert("ignore_user_input".into(), json!(true));
        }
        if let Some(custom) = self.save_custom() {
            data.insert("custom".into(), custom);
        }
        Value::Object(data)
    }

    fn save_custom(&self) -> Option<Value> {
        let ItemKind::Custom(scripted) = &self.kind else {
            return None;
        };
        match scripted.call(&self.id, scripted.callbacks.save.as_ref(), vec![self.id.clone()])? {
            ScriptValue::Text(text) => match serde_json::from_str(&text) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(item = %self.id, error = %e, "custom item save returned invalid JSON");
                    None
                }
            },
            ScriptValue::Nil => None,
            ScriptValue::Bool(b) => Some(json!(b)),
            ScriptValue::Number(n) => Some(json!(n)),
        }
    }

    /// Apply a saved entry. Missing fields keep their current value and
    /// counts are clamped into the (possibly restored) limits. Returns
    /// `None` when `data` is not an object.
    pub fn load(&mut self, data: &Value) -> Option<ItemChange> {
        let obj = data.as_object()?;

        let overlay = obj
            .get("overlay")
            .and_then(Value::as_str)
            .unwrap_or(&self.overlay)
            .to_string();
        let increment = int_or(obj.get("increment"), self.increment);
        let decrement = int_or(obj.get("decrement"), self.decrement);
        let (mut stage1, mut stage2) = (self.stage1, self.stage2);
        if let Some(state) = obj.get("state").and_then(Value::as_array) {
            stage1 = int_or(state.first(), stage1);
            stage2 = int_or(state.get(1), stage2);
        }
        let min_count = int_or(obj.get("min_count"), self.min_count);
        let max_count = int_or(obj.get("max_count"), self.max_count);
        let count = clamp_count(int_or(obj.get("count"), self.count), min_count, max_count);
        let img_override = obj.get("img").and_then(Value::as_str).map(str::to_string);
        let ignore_user_input = obj
            .get("ignore_user_input")
            .and_then(Value::as_bool)
            .unwrap_or(self.ignore_user_input);
        if !self.stages.is_empty() {
            stage2 = stage2.clamp(0, self.stages.len() as i32 - 1);
        }

        // A saved limit is an override even when it matches the current value.
        self.overrides.min_count |= obj.contains_key("min_count") || min_count != self.min_count;
        self.overrides.max_count |= obj.contains_key("max_count") || max_count != self.max_count;
        self.overrides.increment |= obj.contains_key("increment") || increment != self.increment;
        self.overrides.decrement |= obj.contains_key("decrement") || decrement != self.decrement;

        let mut change = ItemChange::NONE;
        if (count, min_count, max_count, stage1, stage2, increment, decrement)
            != (
                self.count,
                self.min_count,
                self.max_count,
                self.stage1,
                self.stage2,
                self.increment,
                self.decrement,
            )
            || overlay != self.overlay
            || ignore_user_input != self.ignore_user_input
        {
            self.count = count;
            self.min_count = min_count;
            self.max_count = max_count;
            self.stage1 = stage1;
            self.stage2 = stage2;
            self.increment = increment;
            self.decrement = decrement;
            self.overlay = overlay;
            self.ignore_user_input = ignore_user_input;
            change.state = true;
        }
        if img_override != self.img_override {
            self.img_override = img_override;
            change.display = true;
        }

        if let (ItemKind::Custom(scripted), Some(custom)) = (&self.kind, obj.get("custom")) {
            let args = vec![self.id.clone(), custom.to_string()];
            if let Some(v) = scripted.call(&self.id, scripted.callbacks.load.as_ref(), args) {
                change.state |= v.is_truthy();
            }
        }
        Some(change)
    }
}
