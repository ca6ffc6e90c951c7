//! OCR collaborator boundary.
//!
//! The text extractor is pure and in-crate; the image engine is an
//! external collaborator behind the `ImageOcr` trait. Failures on either
//! side are non-fatal to ingestion: they yield zero dimensions.

pub mod text;

use std::path::Path;

use thiserror::Error;

use crate::models::CutPiece;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Cannot read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR engine failed: {0}")]
    Engine(String),
}

/// Output of the text extractor.
#[derive(Debug, Clone)]
pub struct OcrTextResult {
    pub dimensions: Vec<CutPiece>,
    pub unit: String,
}

/// Output of the image OCR collaborator.
#[derive(Debug, Clone)]
pub struct ImageOcrResult {
    pub raw_text: String,
    pub dimensions: Vec<CutPiece>,
    pub unit: String,
}

/// External image-to-dimensions engine.
pub trait ImageOcr: Send + Sync {
    fn process_image(&self, path: &Path) -> Result<ImageOcrResult, OcrError>;
}

/// Default engine: reads the file as UTF-8 text (lossy) and reuses the
/// text extractor. A photographed list goes through a real vision engine
/// in deployment; this keeps the pipeline whole without one.
pub struct TextPassthroughOcr;

impl ImageOcr for TextPassthroughOcr {
    fn process_image(&self, path: &Path) -> Result<ImageOcrResult, OcrError> {
        let bytes = std::fs::read(path)?;
        let raw_text = String::from_utf8_lossy(&bytes).into_owned();
        let extracted = text::process_ocr_text(&raw_text);
        Ok(ImageOcrResult {
            raw_text,
            dimensions: extracted.dimensions,
            unit: extracted.unit,
        })
    }
}
