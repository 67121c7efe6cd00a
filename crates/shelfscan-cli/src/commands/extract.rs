//! Extract command - extract label fields from a single OCR text file.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use tracing::{debug, info};

use shelfscan_core::models::config::ShelfConfig;
use shelfscan_core::models::record::classify_expiry;
use shelfscan_core::pipeline::render_summary;
use shelfscan_core::{ExtractionResult, LabelExtractor};

use super::config::default_config_path;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input text file ("-" reads stdin)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show extraction confidence and expiry status
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (with diagnostics)
    Json,
    /// CSV output
    Csv,
    /// Plain text fields
    Text,
    /// Chat-style summary message
    Summary,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text | OutputFormat::Summary => "txt",
        }
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let extractor = build_extractor(&config)?;

    let text = read_input(&args.input)?;
    info!("Extracting from {}", args.input.display());

    let result = extractor.extract(&text);

    let output = format_result(&result, args.format, &config, extractor.weights().total())?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {}/{}",
            style("ℹ").blue(),
            result.confidence,
            extractor.weights().total()
        );
        let status = classify_expiry(result.expiry_date.as_deref(), Local::now().date_naive());
        println!("{} Expiry status: {}", style("ℹ").blue(), status.as_str());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load the explicit config file, else the default one, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ShelfConfig> {
    if let Some(path) = config_path {
        return Ok(ShelfConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(ShelfConfig::from_file(&default_path)?)
    } else {
        Ok(ShelfConfig::default())
    }
}

pub fn build_extractor(config: &ShelfConfig) -> anyhow::Result<LabelExtractor> {
    LabelExtractor::from_config(&config.extraction)
        .map_err(|e| anyhow::anyhow!("Invalid extraction configuration: {}", e))
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    Ok(fs::read_to_string(input)?)
}

pub fn format_result(
    result: &ExtractionResult,
    format: OutputFormat,
    config: &ShelfConfig,
    max_confidence: u32,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
        OutputFormat::Summary => Ok(render_summary(
            result,
            max_confidence,
            &config.pipeline.ocr_provider,
        )),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["product_name", "expiry_date", "quantity", "barcode", "confidence"])?;
    wtr.write_record([
        result.product_name.as_deref().unwrap_or_default(),
        result.expiry_date.as_deref().unwrap_or_default(),
        result.quantity.as_deref().unwrap_or_default(),
        result.barcode.as_deref().unwrap_or_default(),
        &result.confidence.to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

pub fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Product:    {}\n",
        result.product_name.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "Expiry:     {}\n",
        result.expiry_date.as_deref().unwrap_or("Not detected")
    ));
    output.push_str(&format!(
        "Quantity:   {}\n",
        result.quantity.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "Barcode:    {}\n",
        result.barcode.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!("Confidence: {}%\n", result.confidence));

    if !result.diagnostics.matches.is_empty() {
        output.push_str("\nMatched patterns:\n");
        for (category, attempt) in &result.diagnostics.matches {
            output.push_str(&format!(
                "  {:<13} #{} ({} match(es))\n",
                category.as_str(),
                attempt.pattern_index,
                attempt.matches.len()
            ));
        }
    }

    if let Some(error) = &result.diagnostics.error {
        output.push_str(&format!("\nError: {}\n", error));
    }

    output
}
