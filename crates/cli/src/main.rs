mod cli;
mod config;
mod report;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use tracklogic_core::config::load_dotenv;
use tracklogic_core::EngineConfig;
use tracklogic_rules::loader::{load_items_file, load_locations_file, PackLoader};
use tracklogic_rules::Tracker;

use crate::cli::{CliArgs, Click};
use crate::config::{CliConfig, OutputFormat};

fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    let mut engine = EngineConfig::from_env();
    config.apply(&mut engine);
    engine.log_summary();

    let clicks = args
        .clicks
        .iter()
        .map(|c| Click::parse(c))
        .collect::<Result<Vec<_>>>()?;

    let mut tracker = Tracker::new(engine);
    load_pack(&mut tracker, &args, &config)?;

    if let Some(path) = &args.state {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read state: {}", path.display()))?;
        let state: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse state: {}", path.display()))?;
        tracker
            .load_state(&state)
            .with_context(|| format!("failed to restore state: {}", path.display()))?;
    }

    for click in &clicks {
        apply_click(&mut tracker, click);
    }

    if let Some(path) = &args.save_state {
        let text = serde_json::to_string_pretty(&tracker.save_state())?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write state: {}", path.display()))?;
        info!(path = %path.display(), "State saved");
    }

    let format = config.resolve_format(args.format);
    if args.list_items {
        let rows = report::collect_items(&tracker);
        match format {
            OutputFormat::Text => print!("{}", report::render_items_text(&rows)),
            OutputFormat::Json => println!("{}", report::render_json(&rows)?),
        }
        return Ok(());
    }

    let rows = report::collect(&tracker, config.show_hidden);
    match format {
        OutputFormat::Text => print!("{}", report::render_text(&rows)),
        OutputFormat::Json => println!("{}", report::render_json(&rows)?),
    }
    Ok(())
}

fn load_pack(tracker: &mut Tracker, args: &CliArgs, config: &CliConfig) -> Result<()> {
    let mut items = Vec::new();
    let mut locations = Vec::new();

    if let Some(dir) = args.pack.as_ref().or(config.pack.as_ref()) {
        let pack = PackLoader::new(dir)
            .load_all()
            .with_context(|| format!("failed to read pack: {}", dir.display()))?;
        items.extend(pack.items);
        locations.extend(pack.locations);
    }
    for path in &args.items {
        items.extend(
            load_items_file(path)
                .with_context(|| format!("failed to load items: {}", path.display()))?,
        );
    }
    for path in &args.locations {
        locations.extend(
            load_locations_file(path)
                .with_context(|| format!("failed to load locations: {}", path.display()))?,
        );
    }

    if items.is_empty() && locations.is_empty() {
        bail!("nothing to load: pass --pack, --items or --locations");
    }
    tracker.load_items(&items);
    tracker.load_locations(&locations);
    Ok(())
}

/// Resolve the click target as an item id first, then as a code.
fn apply_click(tracker: &mut Tracker, click: &Click) {
    let id = match tracker.item_by_id(&click.target) {
        Some(item) => item.id().to_string(),
        None => match tracker.find_item_for_code(&click.target) {
            Some(item) => item.id().to_string(),
            None => {
                warn!(item = %click.target, "click names no item");
                return;
            }
        },
    };
    let changed = tracker.change_item_state(&id, click.action);
    info!(item = %id, action = %click.action, changed, "Applied click");
}
