//! Batch extraction command for multiple OCR text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use shelfscan_core::models::config::ShelfConfig;
use shelfscan_core::{ExtractionResult, LabelExtractor};

use super::extract::{build_extractor, format_result, load_config, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern (e.g. "scans/*.txt")
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    extraction: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

impl FileResult {
    fn status(&self) -> &'static str {
        match &self.extraction {
            Some(result) if result.is_degraded() => "degraded",
            Some(_) => "success",
            None => "error",
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let extractor = build_extractor(&config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "txt" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let outcome = process_single_file(&path, &extractor);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match outcome {
            Ok(extraction) => results.push(FileResult {
                path,
                extraction: Some(extraction),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        extraction: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    progress.abandon();
                    anyhow::bail!("Processing failed: {}", error_msg);
                }
            }
        }

        progress.inc(1);
    }

    progress.finish_with_message("Complete");

    if let Some(ref output_dir) = args.output_dir {
        write_outputs(
            output_dir,
            &results,
            args.format,
            &config,
            extractor.weights().total(),
        )?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.status() == "success").count();
    let degraded = results.iter().filter(|r| r.status() == "degraded").count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} degraded, {} failed",
        style(successful).green(),
        style(degraded).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(path: &Path, extractor: &LabelExtractor) -> anyhow::Result<ExtractionResult> {
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        warn!("{} contains no text", path.display());
    }

    Ok(extractor.extract(&text))
}

fn write_outputs(
    output_dir: &Path,
    results: &[FileResult],
    format: OutputFormat,
    config: &ShelfConfig,
    max_confidence: u32,
) -> anyhow::Result<()> {
    for result in results {
        let Some(extraction) = &result.extraction else {
            continue;
        };

        let output_name = result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("label");
        let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));

        let content = format_result(extraction, format, config, max_confidence)?;
        fs::write(&output_path, content)?;
        debug!("Wrote output to {}", output_path.display());
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "product_name",
        "expiry_date",
        "quantity",
        "barcode",
        "confidence",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(extraction) = &result.extraction {
            wtr.write_record([
                filename,
                result.status(),
                extraction.product_name.as_deref().unwrap_or_default(),
                extraction.expiry_date.as_deref().unwrap_or_default(),
                extraction.quantity.as_deref().unwrap_or_default(),
                extraction.barcode.as_deref().unwrap_or_default(),
                &extraction.confidence.to_string(),
                &result.processing_time_ms.to_string(),
                extraction.diagnostics.error.as_deref().unwrap_or_default(),
            ])?;
        } else {
            wtr.write_record([
                filename,
                result.status(),
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
