use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use tracklogic_core::{DuplicatePolicy, EngineConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Engine settings that override the environment when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOverrides {
    #[serde(default)]
    pub case_insensitive_codes: Option<bool>,
    #[serde(default)]
    pub duplicate_locations: Option<DuplicatePolicy>,
    #[serde(default)]
    pub max_reference_repeats: Option<usize>,
}

/// CLI configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Also list sections whose visibility rules fail
    #[serde(default)]
    pub show_hidden: bool,

    /// Pack directory used when none is given on the command line
    #[serde(default)]
    pub pack: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineOverrides,
}

impl CliConfig {
    /// Return the default config file path: ~/.config/tracklogic/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("tracklogic");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => match Self::default_config_path() {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            let config: Self = toml::from_str(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))?;
            Ok(config)
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Layer the file's engine overrides on top of `base`.
    pub fn apply(&self, base: &mut EngineConfig) {
        if let Some(v) = self.engine.case_insensitive_codes {
            base.case_insensitive_codes = v;
        }
        if let Some(v) = self.engine.duplicate_locations {
            base.duplicate_locations = v;
        }
        if let Some(v) = self.engine.max_reference_repeats.filter(|n| *n > 0) {
            base.max_reference_repeats = v;
        }
    }

    /// Resolve the output format.
    /// Priority: cli_override > config file.
    pub fn resolve_format(&self, cli_override: Option<OutputFormat>) -> OutputFormat {
        cli_override.unwrap_or(self.format)
    }
}
