//! Section status report.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use tracklogic_core::AccessibilityLevel;
use tracklogic_rules::Tracker;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub location: String,
    pub section: String,
    pub status: AccessibilityLevel,
    pub visible: bool,
    /// Items still to take (cleared ones excluded).
    pub remaining: i32,
}

/// Status of every section in declaration order. Hidden sections are
/// dropped unless `show_hidden`.
pub fn collect(tracker: &Tracker, show_hidden: bool) -> Vec<SectionReport> {
    let mut out = Vec::new();
    for location in tracker.locations().iter() {
        for section in location.sections() {
            let visible = tracker.is_visible(location.id(), Some(section.name()));
            if !visible && !show_hidden {
                continue;
            }
            let canonical = tracker.locations().canonical(section);
            out.push(SectionReport {
                location: location.id().to_string(),
                section: section.name().to_string(),
                status: tracker.section_status(location.id(), section.name()),
                visible,
                remaining: canonical.available_count(),
            });
        }
    }
    out
}

/// One item as a tracker UI shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemReport {
    pub id: String,
    pub name: String,
    /// Stage name of the item drawn for this one (the base item for badges).
    pub shown: String,
    pub enabled: bool,
    pub count: i32,
    /// Set for badges whose base item is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
}

/// Every item in load order.
pub fn collect_items(tracker: &Tracker) -> Vec<ItemReport> {
    tracker
        .items()
        .iter()
        .map(|item| {
            let display = tracker.display_item(item.id()).unwrap_or(item);
            let base = (display.id() != item.id()).then(|| display.id().to_string());
            ItemReport {
                id: item.id().to_string(),
                name: item.name().to_string(),
                shown: display.current_name().to_string(),
                enabled: item.state() != 0,
                count: item.count(),
                base,
            }
        })
        .collect()
}

pub fn render_items_text(rows: &[ItemReport]) -> String {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let state = if row.enabled { "on" } else { "off" };
        let _ = writeln!(
            out,
            "{:>4}  {:<width$}  {:<3}  {:>3}  {}",
            row.id,
            row.name,
            state,
            row.count,
            row.shown,
            width = width
        );
    }
    out
}

pub fn render_text(rows: &[SectionReport]) -> String {
    let width = rows
        .iter()
        .map(|r| r.location.len() + r.section.len() + 1)
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        let name = format!("{}/{}", row.location, row.section);
        let hidden = if row.visible { "" } else { "  (hidden)" };
        let _ = writeln!(
            out,
            "{:<width$}  {:<14}  {:>3}{}",
            name,
            row.status.to_string(),
            row.remaining,
            hidden,
            width = width
        );
    }
    out
}

pub fn render_json<T: Serialize>(rows: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracklogic_core::{Action, EngineConfig};
    use tracklogic_rules::schema::{ItemDefinition, ItemType, StageDefinition};
    use tracklogic_rules::{Location, LocationSection, RuleSet};

    fn tracker() -> Tracker {
        let mut t = Tracker::new(EngineConfig::default());
        t.load_items(&[ItemDefinition::new("Lamp", ItemType::Toggle, "lamp")]);
        t.add_locations(vec![Location::new("Cave", None)
            .with_section(
                LocationSection::new("Chest")
                    .with_item_count(2)
                    .with_access_rules(RuleSet::from_strs(&[&["lamp"]])),
            )
            .with_section(
                LocationSection::new("Secret")
                    .with_visibility_rules(RuleSet::from_strs(&[&["lamp"]])),
            )]);
        t
    }

    #[test]
    fn hidden_sections_are_filtered() {
        let t = tracker();
        let rows = collect(&t, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AccessibilityLevel::None);
        assert_eq!(rows[0].remaining, 2);
        assert_eq!(collect(&t, true).len(), 2);
    }

    #[test]
    fn text_report_lists_status_per_section() {
        let mut t = tracker();
        t.change_item_state("1", Action::Primary);
        let text = render_text(&collect(&t, false));
        assert!(text.contains("Cave/Chest"));
        assert!(text.contains("normal"));
        assert!(text.contains("Cave/Secret"));
        assert!(!text.contains("hidden"));
    }

    #[test]
    fn json_report_uses_snake_case_levels() {
        let t = tracker();
        let json = render_json(&collect(&t, true)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["status"], "none");
        assert_eq!(parsed[1]["visible"], false);
    }

    #[test]
    fn badges_show_their_base_item() {
        let mut t = tracker();
        t.load_items(&[
            ItemDefinition {
                stages: vec![
                    StageDefinition {
                        name: "Fighter Sword".into(),
                        codes: "sword".into(),
                        ..Default::default()
                    },
                    StageDefinition {
                        name: "Master Sword".into(),
                        codes: "sword2".into(),
                        ..Default::default()
                    },
                ],
                ..ItemDefinition::new("Sword", ItemType::Progressive, "")
            },
            ItemDefinition {
                base_item: Some("sword".into()),
                ..ItemDefinition::new("Sword Badge", ItemType::ToggleBadged, "swordbadge")
            },
        ]);
        t.change_item_state("2", Action::Next);
        t.change_item_state("2", Action::Next);

        let rows = collect_items(&t);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].shown, "Lamp");
        assert_eq!(rows[0].base, None);
        assert_eq!(rows[2].name, "Sword Badge");
        assert_eq!(rows[2].shown, "Master Sword");
        assert_eq!(rows[2].base.as_deref(), Some("2"));
        assert!(!rows[2].enabled);

        let text = render_items_text(&rows);
        assert!(text.contains("Sword Badge"));
        assert!(text.contains("Master Sword"));
        let json: serde_json::Value = serde_json::from_str(&render_json(&rows).unwrap()).unwrap();
        assert!(json[0].get("base").is_none());
        assert_eq!(json[2]["base"], "2");
    }
}
