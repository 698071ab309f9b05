pub mod accessibility;
pub mod action;
pub mod config;
pub mod error;
pub mod highlight;

pub use accessibility::AccessibilityLevel;
pub use action::Action;
pub use config::{DuplicatePolicy, EngineConfig};
pub use error::*;
pub use highlight::Highlight;
