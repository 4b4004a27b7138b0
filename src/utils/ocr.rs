use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Settings for the local OCR fallback
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract language code
    pub language: String,
    /// Rasterization resolution passed to pdftoppm
    pub dpi: u32,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "spa".to_string(),
            dpi: 300,
        }
    }
}

pub fn command_available(name: &str) -> bool {
    Command::new(name).arg("--version").output().is_ok()
}

/// Perform OCR on a PDF file using Tesseract (external tool)
///
/// Requires `pdftoppm` (poppler-utils) and `tesseract` with the requested
/// language data on `PATH`. Pages are returned in order, separated by form feeds.
pub fn ocr_pdf_with_tesseract(path: &Path, options: &OcrOptions) -> Result<String> {
    info!("Performing OCR on PDF: {:?} (lang={})", path, options.language);

    if !command_available("tesseract") {
        anyhow::bail!(
            "Tesseract OCR is not installed or not in PATH. \
             Please install Tesseract: https://github.com/tesseract-ocr/tesseract"
        );
    }
    if !command_available("pdftoppm") {
        anyhow::bail!("PDF to image conversion failed. Install poppler-utils (pdftoppm)");
    }

    let temp_dir = tempfile::Builder::new()
        .prefix("deed_ocr_")
        .tempdir()
        .with_context(|| "Failed to create OCR scratch directory")?;

    info!("Converting PDF to images...");
    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg(options.dpi.to_string())
        .arg(path)
        .arg(temp_dir.path().join("page"))
        .output()
        .with_context(|| format!("Failed to run pdftoppm on {:?}", path))?;

    if !output.status.success() {
        anyhow::bail!(
            "pdftoppm failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    // pdftoppm zero-pads page numbers, so name order is page order.
    let mut images: Vec<PathBuf> = std::fs::read_dir(temp_dir.path())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("png"))
        .collect();
    images.sort();

    let mut pages = Vec::with_capacity(images.len());

    for (idx, image) in images.iter().enumerate() {
        let page_number = idx + 1;
        info!("OCR processing page {}/{}...", page_number, images.len());

        // "stdout" as output base makes tesseract print the text instead of writing a file.
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&options.language)
            .output()
            .with_context(|| format!("Failed to run tesseract on page {}", page_number))?;

        if !output.status.success() {
            warn!("Tesseract failed for page {}", page_number);
            continue;
        }

        pages.push(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    info!("OCR completed: {} pages processed", pages.len());

    if pages.iter().all(|p| p.trim().is_empty()) {
        anyhow::bail!("OCR produced no text");
    }

    Ok(pages.join("\x0C"))
}

/// Use the PDF text layer when present, otherwise fall back to OCR.
pub fn auto_ocr_if_needed(path: &Path, options: &OcrOptions) -> Result<String> {
    match crate::utils::pdf_parser::extract_text_from_pdf(path) {
        Ok(content) if content.has_text => {
            info!("PDF has extractable text, no OCR needed");
            return Ok(content.text);
        }
        Ok(_) => info!("PDF appears to be scanned, attempting OCR..."),
        Err(err) => warn!("Text layer extraction failed ({}), attempting OCR...", err),
    }

    ocr_pdf_with_tesseract(path, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_is_spanish() {
        let options = OcrOptions::default();
        assert_eq!(options.language, "spa");
        assert_eq!(options.dpi, 300);
    }

    #[test]
    fn test_missing_command_is_unavailable() {
        assert!(!command_available("deed-cleanup-no-such-binary"));
    }
}
