use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracklogic_core::Action;

use crate::config::OutputFormat;

/// Evaluate tracker logic for a pack and print every section's status.
///
/// Items and locations come from a pack directory (`items/`, `locations/`)
/// and/or individual JSON files. Clicks are applied in order after any
/// saved state has been restored.
#[derive(Parser, Debug)]
#[command(name = "tracklogic", about = "Evaluate item/location tracker logic")]
pub struct CliArgs {
    /// Pack directory containing items/ and locations/
    #[arg(long, env = "TRACKLOGIC_PACK")]
    pub pack: Option<PathBuf>,

    /// Items file (JSON or JSONC); may be repeated
    #[arg(long)]
    pub items: Vec<PathBuf>,

    /// Locations file (JSON or JSONC); may be repeated
    #[arg(long)]
    pub locations: Vec<PathBuf>,

    /// Saved tracker state to restore before clicking
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Item action as ID[:action], where ID is an item id or code and
    /// action defaults to primary; may be repeated
    #[arg(long = "click")]
    pub clicks: Vec<String>,

    /// Output format (overrides the config file)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Path to config file (default: ~/.config/tracklogic/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Write the final tracker state here
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// List items instead of sections
    #[arg(long)]
    pub list_items: bool,
}

/// One `--click` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub target: String,
    pub action: Action,
}

impl Click {
    /// Split at the last `:` only when what follows is a known action, so
    /// codes containing colons still work.
    pub fn parse(arg: &str) -> Result<Self> {
        if let Some((target, action)) = arg.rsplit_once(':') {
            if let Ok(action) = action.parse::<Action>() {
                return Self::new(target, action);
            }
        }
        Self::new(arg, Action::Primary)
    }

    fn new(target: &str, action: Action) -> Result<Self> {
        let target = target.trim();
        if target.is_empty() {
            return Err(anyhow!("click needs an item id or code"));
        }
        Ok(Self {
            target: target.to_string(),
            action,
        })
    }
}
