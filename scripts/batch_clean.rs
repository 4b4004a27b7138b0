use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use deed_cleanup::utils::{auto_ocr_if_needed, extract_text_from_pdf, OcrOptions};
use deed_cleanup::{CleanupConfig, CleanupReport, DeedCleaner};

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean a directory of deed transcriptions (PDF/TXT)")]
struct Args {
    /// Input directory containing PDF/TXT files
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for cleaned files
    #[arg(short, long)]
    output: PathBuf,

    /// Path to cleanup configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable OCR for scanned PDFs
    #[arg(long, default_value = "false")]
    enable_ocr: bool,

    /// Tesseract language for OCR
    #[arg(long, default_value = "spa")]
    ocr_lang: String,
}

#[derive(Debug, Serialize)]
struct DocumentEntry {
    filename: String,
    file_type: String,
    output: String,
    report: CleanupReport,
}

#[derive(Debug, Serialize)]
struct FailedEntry {
    filename: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct BatchManifest {
    config_version: u32,
    total_documents: usize,
    total_noise_lines: usize,
    total_scrubbed_lines: usize,
    documents: Vec<DocumentEntry>,
    failed: Vec<FailedEntry>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting batch cleanup");
    info!("Input directory: {:?}", args.input);
    info!("Output directory: {:?}", args.output);

    let config = match &args.config {
        Some(path) => CleanupConfig::from_json_file(path)?,
        None => CleanupConfig::default(),
    };
    info!("Cleanup config: {}", config);
    let cleaner = DeedCleaner::new(&config).with_context(|| "Invalid cleanup configuration")?;

    let ocr = OcrOptions {
        language: args.ocr_lang.clone(),
        ..OcrOptions::default()
    };

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output))?;

    let mut files = Vec::new();

    for entry in WalkDir::new(&args.input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();

        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();

            if ext_str == "pdf" || ext_str == "txt" {
                files.push(path.to_path_buf());
            }
        }
    }

    info!("Found {} deed files", files.len());

    if files.is_empty() {
        anyhow::bail!("No PDF/TXT files found in {:?}", args.input);
    }

    let mut documents = Vec::new();
    let mut failed = Vec::new();

    for (idx, path) in files.iter().enumerate() {
        info!("Processing {}/{}: {:?}", idx + 1, files.len(), path);

        let relative = path.strip_prefix(&args.input).unwrap_or(path.as_path());
        let filename = relative.to_string_lossy().into_owned();

        let raw = match load_document(path, args.enable_ocr, &ocr) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to process {:?}: {}", path, e);
                failed.push(FailedEntry {
                    filename,
                    error: format!("{:#}", e),
                });
                continue;
            }
        };

        let outcome = cleaner.clean_with_report(&raw);

        let output_name = output_name_for(relative);
        let doc_path = args.output.join(&output_name);
        if let Some(parent) = doc_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
        fs::write(&doc_path, &outcome.text)
            .with_context(|| format!("Failed to write document: {:?}", doc_path))?;

        documents.push(DocumentEntry {
            filename,
            file_type: path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_lowercase(),
            output: output_name.to_string_lossy().into_owned(),
            report: outcome.report,
        });
    }

    let manifest = BatchManifest {
        config_version: config.version,
        total_documents: documents.len(),
        total_noise_lines: documents.iter().map(|d| d.report.noise_lines).sum(),
        total_scrubbed_lines: documents.iter().map(|d| d.report.scrubbed_lines).sum(),
        documents,
        failed,
    };

    let manifest_path = args.output.join("manifest.json");
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("Failed to write manifest: {:?}", manifest_path))?;
    info!("Manifest saved to: {:?}", manifest_path);

    info!("Batch cleanup complete!");
    info!("Summary:");
    info!("  - Documents: {}", manifest.total_documents);
    info!("  - Failed: {}", manifest.failed.len());
    info!("  - Noise lines dropped: {}", manifest.total_noise_lines);
    info!("  - Lines scrubbed: {}", manifest.total_scrubbed_lines);

    Ok(())
}

/// `x/deed.pdf` becomes `x/deed.pdf.txt`, so `deed.pdf` and `deed.txt`, or
/// the same name in two subdirectories, never share an output file.
fn output_name_for(relative: &Path) -> PathBuf {
    let mut name = relative.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

fn load_document(path: &Path, enable_ocr: bool, ocr: &OcrOptions) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "pdf" => {
            if enable_ocr {
                auto_ocr_if_needed(path, ocr)
            } else {
                let content = extract_text_from_pdf(path)?;

                if !content.has_text {
                    anyhow::bail!("PDF has no extractable text (enable OCR with --enable-ocr)");
                }

                Ok(content.text)
            }
        }
        "txt" => fs::read_to_string(path)
            .with_context(|| format!("Failed to read text file: {:?}", path)),
        _ => {
            anyhow::bail!("Unsupported file format: {}", ext);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_keep_directory_and_extension() {
        assert_eq!(
            output_name_for(Path::new("x/deed.pdf")),
            PathBuf::from("x/deed.pdf.txt")
        );
        assert_ne!(
            output_name_for(Path::new("deed.pdf")),
            output_name_for(Path::new("deed.txt"))
        );
        assert_ne!(
            output_name_for(Path::new("x/deed.txt")),
            output_name_for(Path::new("y/deed.txt"))
        );
    }
}
