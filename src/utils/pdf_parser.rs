use anyhow::{Context, Result};
use pdf_extract::extract_text;
use std::path::Path;
use tracing::{info, warn};

use super::text_processor::{split_pages, visible_char_count};

/// Below this many visible characters per page a PDF is treated as a scan.
pub const MIN_TEXT_CHARS_PER_PAGE: usize = 40;

/// Text layer of a deed PDF
#[derive(Debug, Clone)]
pub struct PdfContent {
    pub text: String,
    pub pages: Vec<String>,
    pub has_text: bool,
}

impl PdfContent {
    fn from_text(text: String) -> Self {
        let pages = split_pages(&text);
        let page_count = pages.len().max(1);
        let has_text = visible_char_count(&text) >= MIN_TEXT_CHARS_PER_PAGE * page_count;

        Self {
            text,
            pages,
            has_text,
        }
    }
}

/// Extract the text layer from a PDF file
pub fn extract_text_from_pdf(path: &Path) -> Result<PdfContent> {
    info!("Extracting text from PDF: {:?}", path);

    let text = extract_text(path)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    let content = PdfContent::from_text(text);

    if !content.has_text {
        warn!("PDF appears to be scanned or has no extractable text: {:?}", path);
    }

    info!("Extracted {} pages from PDF", content.pages.len());

    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanned_pdf_detection() {
        let content = PdfContent::from_text("  \x0C 12 \x0C".to_string());
        assert!(!content.has_text);
        assert_eq!(content.pages.len(), 1);
    }

    #[test]
    fn test_text_layer_detection() {
        let page = "El compareciente dijo que vendía la finca descrita en el expositivo.";
        let content = PdfContent::from_text(format!("{page}\x0C{page}"));
        assert!(content.has_text);
        assert_eq!(content.pages.len(), 2);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(extract_text_from_pdf(Path::new("/nonexistent/escritura.pdf")).is_err());
    }
}
