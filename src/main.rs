use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use deed_cleanup::config::{CleanupConfig, ScrubMode};
use deed_cleanup::utils::model_response::clean_model_response;
use deed_cleanup::utils::{auto_ocr_if_needed, extract_text_from_pdf, OcrOptions};
use deed_cleanup::DeedCleaner;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean OCR transcriptions of notarial deeds")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Clean a transcription (.txt, .pdf, or "-" for stdin)
    Clean(CleanArgs),
    /// Clean the text fields of a generative-model JSON reply
    Json(JsonArgs),
    /// Print the default cleanup configuration as JSON
    Config,
}

#[derive(Debug, Args)]
struct CleanupArgs {
    /// Path to cleanup configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the scrub-in-place length threshold (chars)
    #[arg(long)]
    threshold: Option<usize>,

    /// Scrub every retained line, not only long lines carrying a marker
    #[arg(long, default_value = "false")]
    scrub_all: bool,
}

#[derive(Debug, Args)]
struct CleanArgs {
    /// Input file, or "-" for stdin
    input: PathBuf,

    /// Write cleaned text here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON cleanup report to stderr
    #[arg(long, default_value = "false")]
    report: bool,

    /// Enable OCR for scanned PDFs
    #[arg(long, default_value = "false")]
    enable_ocr: bool,

    /// Tesseract language for OCR
    #[arg(long, default_value = "spa")]
    ocr_lang: String,

    #[command(flatten)]
    cleanup: CleanupArgs,
}

#[derive(Debug, Args)]
struct JsonArgs {
    /// Model reply file, or "-" for stdin
    input: PathBuf,

    /// Field to clean (repeatable). Cleans every string when omitted.
    #[arg(long = "field")]
    fields: Vec<String>,

    #[command(flatten)]
    cleanup: CleanupArgs,
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the cleaned text
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean(args) => clean_command(args),
        Commands::Json(args) => json_command(args),
        Commands::Config => {
            println!("{}", CleanupConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn build_cleaner(args: &CleanupArgs) -> Result<DeedCleaner> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading cleanup configuration from: {:?}", path);
            CleanupConfig::from_json_file(path)?
        }
        None => CleanupConfig::default(),
    };

    if let Some(threshold) = args.threshold {
        config.scrub_length_threshold = threshold;
    }
    if args.scrub_all {
        config.scrub_mode = ScrubMode::AllLines;
    }

    info!("Cleanup config: {}", config);

    DeedCleaner::new(&config).with_context(|| "Invalid cleanup configuration")
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .with_context(|| "Failed to read stdin")?;
        return Ok(buffer);
    }

    fs::read_to_string(path).with_context(|| format!("Failed to read input file: {:?}", path))
}

fn load_transcription(path: &Path, enable_ocr: bool, ocr_lang: &str) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext != "pdf" {
        return read_input(path);
    }

    if enable_ocr {
        let options = OcrOptions {
            language: ocr_lang.to_string(),
            ..OcrOptions::default()
        };
        return auto_ocr_if_needed(path, &options);
    }

    let content = extract_text_from_pdf(path)?;
    if !content.has_text {
        anyhow::bail!("PDF has no extractable text (enable OCR with --enable-ocr)");
    }
    Ok(content.text)
}

fn clean_command(args: CleanArgs) -> Result<()> {
    let cleaner = build_cleaner(&args.cleanup)?;
    let raw = load_transcription(&args.input, args.enable_ocr, &args.ocr_lang)?;

    let outcome = cleaner.clean_with_report(&raw);
    info!(
        "Cleaned {} lines: {} noise, {} scrubbed",
        outcome.report.lines_in, outcome.report.noise_lines, outcome.report.scrubbed_lines
    );

    match &args.output {
        Some(path) => {
            fs::write(path, &outcome.text)
                .with_context(|| format!("Failed to write output: {:?}", path))?;
            info!("Cleaned text saved to: {:?}", path);
        }
        None => println!("{}", outcome.text),
    }

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&outcome.report)?);
    }

    Ok(())
}

fn json_command(args: JsonArgs) -> Result<()> {
    let cleaner = build_cleaner(&args.cleanup)?;
    let raw = read_input(&args.input)?;

    let value = clean_model_response(&raw, &args.fields, &cleaner)?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}
