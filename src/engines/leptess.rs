//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone photos.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use.

use crate::config::Config;
use crate::engine::{OcrEngine, Recognition};
use crate::error::OcrError;
use image::DynamicImage;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// Tesseract only ever reads the MRZ, which is Latin OCR-B
const LANGUAGE: &str = "eng";

/// Characters Tesseract may emit. Lowercase and space are allowed so that
/// misreads surface as non-candidate lines instead of being forced onto a
/// wrong uppercase glyph.
const CHAR_WHITELIST: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789< ";

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available()?,
        };

        // Fail at startup rather than on the first request
        drop(Self::tesseract(&tessdata_path)?);

        tracing::info!("Leptess engine initialized (tessdata: {})", tessdata_path);

        Ok(Self { tessdata_path })
    }

    fn tesseract(tessdata_path: &str) -> Result<Tesseract, OcrError> {
        Tesseract::new(Some(tessdata_path), Some(LANGUAGE))
            .map_err(|e| {
                OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
            })?
            .set_variable("tessedit_char_whitelist", CHAR_WHITELIST)
            .map_err(|e| {
                OcrError::InitializationError(format!("Failed to set character whitelist: {}", e))
            })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Recognition, OcrError> {
        let rgb_img = image.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // Convert to BMP in memory (BMP is always supported by leptonica)
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Processing image: {}x{}, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let mut tess = Self::tesseract(&self.tessdata_path)
            .map_err(|e| OcrError::ProcessingError(e.to_string()))?
            .set_image_from_mem(&bmp_data)
            .map_err(|e| OcrError::ProcessingError(format!("Failed to set image: {}", e)))?
            .recognize()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to get text: {}", e)))?;

        // Tesseract reports 0-100 already
        let confidence_percent = tess.mean_text_conf().clamp(0, 100) as f32;

        Ok(Recognition {
            text: text.trim().to_string(),
            confidence_percent,
            warnings: Vec::new(),
        })
    }
}

// ============================================================================
// Tessdata download helpers
// ============================================================================

/// Ensure tessdata is available, downloading if needed; returns the directory
fn ensure_tessdata_available() -> Result<String, OcrError> {
    let dir: PathBuf = super::cache_dir().join("tessdata");
    let file = dir.join(format!("{}.traineddata", LANGUAGE));

    super::ensure_downloaded(&tessdata_url(LANGUAGE), &file)?;

    // Tesseract expects the directory, not the file
    dir.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}
