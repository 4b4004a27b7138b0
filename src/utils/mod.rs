pub mod model_response;
pub mod ocr;
pub mod pdf_parser;
pub mod text_processor;

pub use model_response::{clean_response_fields, extract_json_block};
pub use ocr::{auto_ocr_if_needed, ocr_pdf_with_tesseract, OcrOptions};
pub use pdf_parser::extract_text_from_pdf;
pub use text_processor::normalize_input;
