//! Tracker state save/restore.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use tracklogic_core::{Highlight, Result, TrackerError};

use super::Tracker;
use crate::events::SectionRef;

pub const FORMAT_VERSION: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SavedState {
    tracker: SavedTracker,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavedTracker {
    format_version: i64,
    #[serde(default)]
    items: IndexMap<String, Value>,
    #[serde(default)]
    sections: IndexMap<String, SavedSection>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SavedSection {
    cleared: i32,
    highlight: i64,
}

impl Tracker {
    /// Snapshot of every item and every section with progress or a marker.
    pub fn save_state(&self) -> Value {
        let items = self
            .items
            .iter()
            .map(|item| (item.id().to_string(), item.save()))
            .collect();
        let sections = self
            .graph
            .iter()
            .flat_map(|loc| loc.sections())
            .filter(|s| s.item_cleared() > 0 || s.highlight() != Highlight::None)
            .map(|s| {
                (
                    s.full_id(),
                    SavedSection {
                        cleared: s.item_cleared(),
                        highlight: s.highlight().code(),
                    },
                )
            })
            .collect();

        let state = SavedState {
            tracker: SavedTracker {
                format_version: FORMAT_VERSION,
                items,
                sections,
            },
        };
        serde_json::to_value(state).unwrap_or(Value::Null)
    }

    /// Restore a snapshot produced by [`save_state`](Tracker::save_state).
    /// Unknown items and sections are skipped with a warning.
    pub fn load_state(&mut self, state: &Value) -> Result<()> {
        let tracker = state
            .get("tracker")
            .ok_or_else(|| TrackerError::InvalidState("missing \"tracker\" object".into()))?;
        let version = tracker
            .get("format_version")
            .and_then(Value::as_i64)
            .ok_or_else(|| TrackerError::InvalidState("missing format_version".into()))?;
        if version != FORMAT_VERSION {
            return Err(TrackerError::UnsupportedFormat(version));
        }
        let saved: SavedTracker = serde_json::from_value(tracker.clone())?;

        self.bulk_update(|t| {
            for (id, data) in &saved.items {
                let Some(idx) = t.item_index(id) else {
                    warn!(item = %id, "saved state names unknown item");
                    continue;
                };
                match t.items[idx].load(data) {
                    Some(change) => t.item_changed(idx, change),
                    None => warn!(item = %id, "saved item entry is not an object"),
                }
            }

            for (full_id, section) in &saved.sections {
                let Some(sref) = SectionRef::parse(full_id) else {
                    warn!(section = %full_id, "malformed section id in saved state");
                    continue;
                };
                let Some(sec) = t.graph.find_section_mut(&sref.location, &sref.section) else {
                    warn!(section = %full_id, "saved state names unknown section");
                    continue;
                };
                let cleared = sec.set_item_cleared(section.cleared);
                let marked = sec.set_highlight(Highlight::from_code(section.highlight));
                let sref = sec.section_ref();
                if cleared || marked {
                    t.section_changed(sref);
                }
            }
        });

        info!(
            items = saved.items.len(),
            sections = saved.sections.len(),
            "tracker state loaded"
        );
        Ok(())
    }
}
