//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use shelfscan_core::models::config::ShelfConfig;
use shelfscan_core::LabelExtractor;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "pipeline.ocr_provider")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Compile the pattern table and weights of a configuration file
    Check {
        /// Configuration file (default: the user config file)
        path: Option<PathBuf>,
    },

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(),
        ConfigCommand::Init(init_args) => init_config(init_args),
        ConfigCommand::Get { key } => get_config(&key),
        ConfigCommand::Set { key, value } => set_config(&key, &value),
        ConfigCommand::Check { path } => check_config(path),
        ConfigCommand::Path => show_path(),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shelfscan")
        .join("config.json")
}

fn load_or_default(config_path: &Path) -> anyhow::Result<ShelfConfig> {
    if config_path.exists() {
        Ok(ShelfConfig::from_file(config_path)?)
    } else {
        Ok(ShelfConfig::default())
    }
}

fn show_config() -> anyhow::Result<()> {
    let config_path = default_config_path();

    if !config_path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let config = load_or_default(&config_path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(default_config_path);

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = ShelfConfig::default();
    config.save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(key: &str) -> anyhow::Result<()> {
    let config = load_or_default(&default_config_path())?;
    let json = serde_json::to_value(&config)?;

    println!("{}", serde_json::to_string_pretty(lookup(&json, key)?)?);

    Ok(())
}

fn set_config(key: &str, value: &str) -> anyhow::Result<()> {
    let config_path = default_config_path();

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let config = load_or_default(&config_path)?;

    let (config, parsed_value) = with_value(&config, key, value)?;
    LabelExtractor::from_config(&config.extraction)
        .map_err(|e| anyhow::anyhow!("Refusing to save invalid configuration: {}", e))?;
    config.save(&config_path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

/// Value at a dotted key such as `pipeline.ocr_provider`.
fn lookup<'a>(json: &'a Value, key: &str) -> anyhow::Result<&'a Value> {
    key.split('.').try_fold(json, |current, part| {
        current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))
    })
}

/// Copy of `config` with the dotted `key` set to `value`.
///
/// `value` is read as JSON when it parses (`42`, `["a"]`), else as a plain
/// string. Weights and patterns are keyed by category name.
fn with_value(config: &ShelfConfig, key: &str, value: &str) -> anyhow::Result<(ShelfConfig, Value)> {
    let parsed: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut json = serde_json::to_value(config)?;
    let (parent, last) = match key.rsplit_once('.') {
        Some((parent, last)) => (Some(parent), last),
        None => (None, key),
    };

    let mut target = &mut json;
    for part in parent.into_iter().flat_map(|p| p.split('.')) {
        target = target
            .get_mut(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }
    let Some(section) = target.as_object_mut() else {
        anyhow::bail!("Cannot set value at non-object path");
    };
    section.insert(last.to_string(), parsed.clone());

    Ok((serde_json::from_value(json)?, parsed))
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let config_path = path.unwrap_or_else(default_config_path);
    let config = load_or_default(&config_path)?;

    let extractor = LabelExtractor::from_config(&config.extraction)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    for category in extractor.table().categories() {
        println!(
            "  {:<13} {} pattern(s), weight {}",
            category.as_str(),
            extractor.table().patterns(category).len(),
            extractor.weights().weight(category)
        );
    }
    println!(
        "{} Configuration is valid (total weight {})",
        style("✓").green(),
        extractor.weights().total()
    );

    Ok(())
}

fn show_path() -> anyhow::Result<()> {
    let config_path = default_config_path();

    println!("Configuration file: {}", config_path.display());

    if config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'shelfscan config init' to create a configuration file.");
    }

    Ok(())
}
