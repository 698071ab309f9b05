//! Item/location logic engine for randomizer trackers.
//!
//! This crate provides:
//! - Pack definitions (items, location trees, loose rule shapes) with serde
//! - A JSONC pack loader that flattens rule inheritance
//! - The item state machine for every item variant
//! - The rule evaluator with memoization and recursion cut-off
//! - [`Tracker`], which owns it all and publishes change events

pub mod evaluator;
pub mod events;
pub mod item;
pub mod loader;
pub mod location;
pub mod rule;
pub mod schema;
pub mod script;
pub mod tracker;

pub use events::{SectionRef, SubscriptionId, TrackerEvent};
pub use item::{Item, ItemChange, ItemKind};
pub use location::{Location, LocationGraph, LocationSection};
pub use rule::RuleSet;
pub use script::{FunctionHost, NullHost, ScriptError, ScriptHost, ScriptValue};
pub use tracker::Tracker;
