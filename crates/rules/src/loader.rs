//! Pack file loader and rule inheritance flattening.
//!
//! Reads JSON(C) item and location lists from disk and turns the location
//! tree into flat [`Location`]s whose rules already include everything
//! inherited from their parents.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{info, warn};
use tracklogic_core::{Result, TrackerError};

use crate::location::{Location, LocationGraph, LocationSection};
use crate::rule::{comma_split, RuleSet};
use crate::schema::{
    ItemDefinition, LocationDefinition, NormalizedRules, RuleSpec, SectionDefinition,
};

// ── JSONC ───────────────────────────────────────────────────────────

/// Strip `//` and `/* */` comments and trailing commas, leaving string
/// literals untouched.
pub fn strip_jsonc(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            '}' | ']' => {
                // Drop a trailing comma (and the whitespace after it).
                let trimmed = out.trim_end().len();
                if out[..trimmed].ends_with(',') {
                    let ws = out[trimmed..].to_string();
                    out.truncate(trimmed - 1);
                    out.push_str(&ws);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

pub fn parse_jsonc<T: DeserializeOwned>(text: &str) -> Result<T> {
    Ok(serde_json::from_str(&strip_jsonc(text))?)
}

// ── Load result types ───────────────────────────────────────────────

/// Outcome of loading a single pack file.
#[derive(Debug)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug)]
pub enum LoadStatus {
    /// File parsed; `entries` top-level definitions.
    Loaded { entries: usize },
    /// Dotfile or not a JSON file.
    Skipped { reason: String },
    Failed { error: String },
}

/// Everything read from a pack directory.
#[derive(Debug, Default)]
pub struct PackContents {
    pub items: Vec<ItemDefinition>,
    pub locations: Vec<LocationDefinition>,
    pub results: Vec<LoadResult>,
}

// ── Pack loader ─────────────────────────────────────────────────────

/// Reads a pack laid out as `<root>/items/*.json` and
/// `<root>/locations/*.json` (JSONC accepted). Files load in name order.
pub struct PackLoader {
    root: PathBuf,
}

impl PackLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load both subdirectories. Missing subdirectories are empty; bad
    /// files are reported per file and do not abort the scan.
    pub fn load_all(&self) -> Result<PackContents> {
        let mut contents = PackContents::default();

        for (path, result) in self.scan(&self.root.join("items"))? {
            match result {
                Some(Ok(mut defs)) => {
                    contents.results.push(loaded(path, defs.len()));
                    contents.items.append(&mut defs);
                }
                other => contents.results.push(not_loaded(path, other)),
            }
        }
        for (path, result) in self.scan(&self.root.join("locations"))? {
            match result {
                Some(Ok(mut defs)) => {
                    contents.results.push(loaded(path, defs.len()));
                    contents.locations.append(&mut defs);
                }
                other => contents.results.push(not_loaded(path, other)),
            }
        }

        info!(
            path = %self.root.display(),
            items = contents.items.len(),
            locations = contents.locations.len(),
            files = contents.results.len(),
            "loaded pack"
        );
        Ok(contents)
    }

    /// `None` marks a skipped file.
    #[allow(clippy::type_complexity)]
    fn scan<T: DeserializeOwned>(
        &self,
        dir: &Path,
    ) -> Result<Vec<(PathBuf, Option<Result<Vec<T>>>)>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| {
                let hidden = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with('.'))
                    .unwrap_or(true);
                let is_json = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e == "json" || e == "jsonc")
                    .unwrap_or(false);
                let result = (!hidden && is_json).then(|| load_list(&path));
                (path, result)
            })
            .collect())
    }
}

fn loaded(path: PathBuf, entries: usize) -> LoadResult {
    info!(path = %path.display(), entries, "loaded pack file");
    LoadResult {
        path,
        status: LoadStatus::Loaded { entries },
    }
}

fn not_loaded<T>(path: PathBuf, result: Option<Result<T>>) -> LoadResult {
    let status = match result {
        Some(Err(e)) => {
            warn!(path = %path.display(), error = %e, "failed to load pack file");
            LoadStatus::Failed {
                error: e.to_string(),
            }
        }
        _ => LoadStatus::Skipped {
            reason: "not a JSON file".to_string(),
        },
    };
    LoadResult { path, status }
}

/// Parse a file holding either a list of definitions or a single one.
pub fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = parse_jsonc(&contents)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else if value.is_object() {
        Ok(vec![serde_json::from_value(value)?])
    } else {
        Err(TrackerError::Definition(format!(
            "{}: expected an array or object",
            path.display()
        )))
    }
}

pub fn load_items_file(path: &Path) -> Result<Vec<ItemDefinition>> {
    load_list(path)
}

pub fn load_locations_file(path: &Path) -> Result<Vec<LocationDefinition>> {
    load_list(path)
}

// ── Inheritance flattening ──────────────────────────────────────────

/// Flatten a location tree. `known` is consulted (together with locations
/// flattened earlier in this call) to resolve explicit `parent` links.
pub fn flatten_locations(defs: &[LocationDefinition], known: &LocationGraph) -> Vec<Location> {
    let mut out = Vec::new();
    let empty = RuleSet::default();
    for def in defs {
        flatten_into(def, None, &empty, &empty, known, &mut out);
    }
    let sections: usize = out.iter().map(|l| l.sections().len()).sum();
    info!(locations = out.len(), sections, "flattened location tree");
    out
}

fn flatten_into(
    def: &LocationDefinition,
    parent_id: Option<&str>,
    inherited_access: &RuleSet,
    inherited_visibility: &RuleSet,
    known: &LocationGraph,
    out: &mut Vec<Location>,
) {
    let explicit = def
        .parent
        .as_deref()
        .map(|p| p.strip_prefix('@').unwrap_or(p))
        .filter(|p| !p.is_empty());

    let found = explicit.and_then(|p| {
        let hit = find_parent(p, known, out);
        if hit.is_none() {
            warn!(location = %def.name, parent = %p, "parent location not found");
        }
        hit
    });
    let (parent_access, parent_visibility) = match found {
        Some((access, visibility)) => (access, visibility),
        None => (inherited_access.clone(), inherited_visibility.clone()),
    };

    let access = merge_rules(&parent_access, def.access_rules.as_ref(), &def.name, "access");
    let visibility = merge_rules(
        &parent_visibility,
        def.visibility_rules.as_ref(),
        &def.name,
        "visibility",
    );

    let mut location = Location::new(&def.name, parent_id)
        .with_access_rules(access.clone())
        .with_visibility_rules(visibility.clone());
    for section in &def.sections {
        location.push_section(flatten_section(section, &access, &visibility));
    }
    let id = location.id().to_string();
    out.push(location);

    for child in &def.children {
        flatten_into(child, Some(&id), &access, &visibility, known, out);
    }
}

/// Rules of the location `id`: exact id, then suffix on a `/` boundary.
fn find_parent(id: &str, known: &LocationGraph, flattened: &[Location]) -> Option<(RuleSet, RuleSet)> {
    let suffix = format!("/{}", id);
    let rules = |l: &Location| (l.access_rules().clone(), l.visibility_rules().clone());

    known
        .find_location(id, false)
        .or_else(|| flattened.iter().find(|l| l.id() == id))
        .or_else(|| known.iter().find(|l| l.id().ends_with(&suffix)))
        .or_else(|| flattened.iter().find(|l| l.id().ends_with(&suffix)))
        .map(rules)
}

fn merge_rules(parent: &RuleSet, spec: Option<&RuleSpec>, owner: &str, kind: &str) -> RuleSet {
    let Some(spec) = spec else {
        return parent.clone();
    };
    let normalized = spec.normalize(|bad| {
        warn!(owner = %owner, kind = %kind, value = %bad, "invalid rule entry skipped");
    });
    match normalized {
        NormalizedRules::Own(alternatives) if !alternatives.is_empty() => {
            RuleSet::inherit(parent, alternatives)
        }
        _ => parent.clone(),
    }
}

fn flatten_section(def: &SectionDefinition, access: &RuleSet, visibility: &RuleSet) -> LocationSection {
    let hosted = comma_split(&def.hosted_item);
    let default_count = if hosted.is_empty() && def.reference.is_none() { 1 } else { 0 };
    let item_count = def.item_count.unwrap_or(default_count);

    let has_own_rules = def.access_rules.is_some() || def.visibility_rules.is_some();
    if def.reference.is_some() && (item_count > 0 || !hosted.is_empty() || has_own_rules) {
        warn!(section = %def.name, "section has a ref and its own data; the ref target's rules apply");
    }

    let mut section = LocationSection::new(&def.name)
        .with_item_count(item_count)
        .with_clear_as_group(def.clear_as_group)
        .with_hosted_items(hosted)
        .with_access_rules(merge_rules(access, def.access_rules.as_ref(), &def.name, "access"))
        .with_visibility_rules(merge_rules(
            visibility,
            def.visibility_rules.as_ref(),
            &def.name,
            "visibility",
        ));
    if let Some(target) = def.reference.as_deref().filter(|r| !r.is_empty()) {
        section = section.with_reference(target);
    }
    section
}
