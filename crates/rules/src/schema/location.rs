//! Location tree entries.

use serde::{Deserialize, Serialize};

use super::default_true;
use super::RuleSpec;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationDefinition {
    pub name: String,
    /// `@`-prefixed id of an already loaded location whose rules this one
    /// inherits instead of its tree parent's.
    pub parent: Option<String>,
    pub access_rules: Option<RuleSpec>,
    pub visibility_rules: Option<RuleSpec>,
    pub sections: Vec<SectionDefinition>,
    pub children: Vec<LocationDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionDefinition {
    pub name: String,
    /// Defaults to 1, or 0 when the section hosts items or is a `ref`.
    pub item_count: Option<i32>,
    /// Comma-separated item codes.
    pub hosted_item: String,
    pub clear_as_group: bool,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub access_rules: Option<RuleSpec>,
    pub visibility_rules: Option<RuleSpec>,
}

impl Default for SectionDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            item_count: None,
            hosted_item: String::new(),
            clear_as_group: default_true(),
            reference: None,
            access_rules: None,
            visibility_rules: None,
        }
    }
}
