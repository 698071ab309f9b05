//! Pack definition types with serde deserialization.
//!
//! These are the shapes the pack loader hands to the engine:
//! - `ItemDefinition`: one entry of an items list
//! - `LocationDefinition` / `SectionDefinition`: the location tree, before
//!   inheritance flattening
//! - `RuleSpec`: the loose on-disk rule shapes, normalized by the loader

mod item;
mod location;
mod rules;

pub use item::*;
pub use location::*;
pub use rules::*;

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests;
